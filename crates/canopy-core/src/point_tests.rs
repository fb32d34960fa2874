use crate::Point;

#[test]
fn ordering_is_row_major() {
    assert!(Point::new(0, 9) < Point::new(1, 0));
    assert!(Point::new(2, 3) < Point::new(2, 4));
    assert_eq!(Point::new(1, 1), Point::new(1, 1));
}

#[test]
fn display_format() {
    assert_eq!(Point::new(3, 14).to_string(), "3:14");
    assert_eq!(Point::ZERO.to_string(), "0:0");
}
