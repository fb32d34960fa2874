//! Flattening: rule trees into productions.
//!
//! Each named rule becomes either a terminal (bare literal/pattern/token
//! body) or a nonterminal with one production per alternative. Nested
//! `Choice`/`Repeat` constructs become hidden auxiliary nonterminals whose
//! nodes are spliced into their parents at parse time, so repetition is
//! flat in the final tree. Precedence wrappers annotate the productions
//! generated beneath them.

use std::collections::HashMap;

use canopy_core::{Grammar, NameId, NameInterner, Rule};
use canopy_tables::Assoc;

use crate::error::GrammarError;

/// Terminal index into [`FlatGrammar::terminals`]. Index 0 is end-of-input.
pub(crate) type TermIndex = usize;

/// Nonterminal index into [`FlatGrammar::nonterminals`].
pub(crate) type NtIndex = usize;

/// A symbol occurrence in a production right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum SymRef {
    T(TermIndex),
    N(NtIndex),
}

/// How a terminal is matched, before DFA construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum FlatMatcher {
    End,
    Literal(String),
    Pattern(String),
    External(u16),
}

#[derive(Debug, Clone)]
pub(crate) struct TerminalSpec {
    pub name: String,
    pub named: bool,
    pub extra: bool,
    pub matcher: FlatMatcher,
}

#[derive(Debug, Clone)]
pub(crate) struct NonterminalSpec {
    pub name: String,
    /// Hidden nonterminals (underscore-prefixed or auxiliary) are spliced
    /// into their parent's child list instead of producing nodes.
    pub visible: bool,
    /// The rule name used when matching declared conflict sets. Auxiliary
    /// rules report their owning rule, since only authored names can be
    /// declared.
    pub conflict_name: String,
}

#[derive(Debug, Clone)]
pub(crate) struct FlatProduction {
    pub lhs: NtIndex,
    pub rhs: Vec<SymRef>,
    pub prec: i32,
    pub assoc: Assoc,
    pub dynamic_prec: i32,
}

/// The flattened grammar: numbered terminals, nonterminals, productions.
#[derive(Debug)]
pub(crate) struct FlatGrammar {
    pub name: String,
    pub terminals: Vec<TerminalSpec>,
    pub nonterminals: Vec<NonterminalSpec>,
    pub productions: Vec<FlatProduction>,
    pub start: NtIndex,
    pub word: Option<TermIndex>,
    /// Declared conflict sets, as rule names.
    pub conflicts: Vec<Vec<String>>,
}

/// Accumulated precedence annotations from `Prec*` wrappers.
#[derive(Debug, Clone, Copy, Default)]
struct Ann {
    prec: i32,
    assoc: Assoc,
    dynamic_prec: i32,
}

#[derive(Debug, Clone, Copy)]
enum RuleKind {
    Terminal(TermIndex),
    Nonterminal(NtIndex),
}

pub(crate) fn flatten(grammar: &Grammar) -> Result<FlatGrammar, GrammarError> {
    if grammar.rules.is_empty() {
        return Err(GrammarError::EmptyGrammar);
    }
    Flattener::new(grammar).run()
}

struct Flattener<'g> {
    grammar: &'g Grammar,
    terminals: Vec<TerminalSpec>,
    terminal_index: HashMap<FlatMatcher, TermIndex>,
    nonterminals: Vec<NonterminalSpec>,
    productions: Vec<FlatProduction>,
    /// Rule names interned once; resolution is id-keyed from here on.
    names: NameInterner,
    rule_kind: HashMap<NameId, RuleKind>,
    word: Option<TermIndex>,
    aux_counter: usize,
}

impl<'g> Flattener<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let mut this = Self {
            grammar,
            terminals: Vec::new(),
            terminal_index: HashMap::new(),
            nonterminals: Vec::new(),
            productions: Vec::new(),
            names: NameInterner::new(),
            rule_kind: HashMap::new(),
            word: None,
            aux_counter: 0,
        };
        this.terminals.push(TerminalSpec {
            name: "end".to_string(),
            named: false,
            extra: false,
            matcher: FlatMatcher::End,
        });
        this
    }

    /// Resolve an already-registered rule name.
    fn kind_of(&self, name: &str) -> Option<RuleKind> {
        let id = self.names.get(name)?;
        self.rule_kind.get(&id).copied()
    }

    fn run(mut self) -> Result<FlatGrammar, GrammarError> {
        self.register_rules()?;
        self.register_externals()?;
        self.register_extras()?;
        self.resolve_word()?;

        for (name, body) in &self.grammar.rules {
            if let Some(RuleKind::Nonterminal(nt)) = self.kind_of(name) {
                self.expand_rule(name, nt, body)?;
            }
        }

        let start = self.resolve_start();

        Ok(FlatGrammar {
            name: self.grammar.name.clone(),
            terminals: self.terminals,
            nonterminals: self.nonterminals,
            productions: self.productions,
            start,
            word: self.word,
            conflicts: self.grammar.conflicts.clone(),
        })
    }

    /// Classify every named rule as terminal or nonterminal and register it.
    fn register_rules(&mut self) -> Result<(), GrammarError> {
        for (name, body) in &self.grammar.rules {
            if body.is_terminal_body() {
                let matcher = named_token_matcher(name, body)?;
                let index = self.terminals.len();
                self.terminals.push(TerminalSpec {
                    name: name.clone(),
                    named: true,
                    extra: false,
                    matcher: matcher.clone(),
                });
                self.terminal_index.insert(matcher, index);
                let id = self.names.intern(name);
                self.rule_kind.insert(id, RuleKind::Terminal(index));
            } else {
                let index = self.nonterminals.len();
                self.nonterminals.push(NonterminalSpec {
                    name: name.clone(),
                    visible: !name.starts_with('_'),
                    conflict_name: name.clone(),
                });
                let id = self.names.intern(name);
                self.rule_kind.insert(id, RuleKind::Nonterminal(index));
            }
        }
        Ok(())
    }

    fn register_externals(&mut self) -> Result<(), GrammarError> {
        for (index, external) in self.grammar.externals.iter().enumerate() {
            let Rule::Symbol(name) = external else {
                return Err(GrammarError::MalformedExternal { index });
            };
            let ext = index as u16;
            match self.kind_of(name) {
                // An external naming a token rule overrides its matcher:
                // the scanner hook produces it instead of the lexer.
                Some(RuleKind::Terminal(term)) => {
                    self.terminals[term].matcher = FlatMatcher::External(ext);
                }
                Some(RuleKind::Nonterminal(_)) => {
                    return Err(GrammarError::MalformedExternal { index });
                }
                None => {
                    let term = self.terminals.len();
                    self.terminals.push(TerminalSpec {
                        name: name.clone(),
                        named: true,
                        extra: false,
                        matcher: FlatMatcher::External(ext),
                    });
                    let id = self.names.intern(name);
                    self.rule_kind.insert(id, RuleKind::Terminal(term));
                }
            }
        }
        Ok(())
    }

    fn register_extras(&mut self) -> Result<(), GrammarError> {
        for (index, extra) in self.grammar.extras.iter().enumerate() {
            let term = match extra {
                Rule::Symbol(name) => match self.kind_of(name) {
                    Some(RuleKind::Terminal(term)) => term,
                    _ => {
                        return Err(GrammarError::Undeclared {
                            rule: "extras".to_string(),
                            symbol: name.clone(),
                        });
                    }
                },
                other if other.is_terminal_body() => {
                    self.intern_inline_terminal("extras", other)?
                }
                _ => return Err(GrammarError::MalformedExtra { index }),
            };
            self.terminals[term].extra = true;
        }
        Ok(())
    }

    fn resolve_word(&mut self) -> Result<(), GrammarError> {
        if let Some(word) = self.grammar.word.clone() {
            match self.kind_of(&word) {
                Some(RuleKind::Terminal(term)) => self.word = Some(term),
                _ => {
                    return Err(GrammarError::Undeclared {
                        rule: "word".to_string(),
                        symbol: word,
                    });
                }
            }
        }
        Ok(())
    }

    /// The entry nonterminal. A token entry rule gets a hidden wrapper so
    /// the automaton always starts on a nonterminal.
    fn resolve_start(&mut self) -> NtIndex {
        let (first_name, _) = &self.grammar.rules[0];
        match self.kind_of(first_name) {
            Some(RuleKind::Nonterminal(nt)) => nt,
            Some(RuleKind::Terminal(term)) => {
                let nt = self.nonterminals.len();
                self.nonterminals.push(NonterminalSpec {
                    name: "_start".to_string(),
                    visible: false,
                    conflict_name: "_start".to_string(),
                });
                self.productions.push(FlatProduction {
                    lhs: nt,
                    rhs: vec![SymRef::T(term)],
                    prec: 0,
                    assoc: Assoc::None,
                    dynamic_prec: 0,
                });
                nt
            }
            None => unreachable!("every rule is registered"),
        }
    }

    /// Expand one nonterminal rule body into productions.
    fn expand_rule(&mut self, owner: &str, nt: NtIndex, body: &Rule) -> Result<(), GrammarError> {
        let mut ann = Ann::default();
        let body = strip_prec(body, &mut ann);

        let alternatives: Vec<&Rule> = match body {
            Rule::Choice(members) => members.iter().collect(),
            other => vec![other],
        };

        for alt in alternatives {
            let mut alt_ann = ann;
            let alt = strip_prec(alt, &mut alt_ann);
            let mut rhs = Vec::new();
            self.expand_seq(owner, alt, &mut rhs)?;
            self.productions.push(FlatProduction {
                lhs: nt,
                rhs,
                prec: alt_ann.prec,
                assoc: alt_ann.assoc,
                dynamic_prec: alt_ann.dynamic_prec,
            });
        }
        Ok(())
    }

    /// Expand a rule in sequence position, appending symbol refs to `out`.
    fn expand_seq(
        &mut self,
        owner: &str,
        rule: &Rule,
        out: &mut Vec<SymRef>,
    ) -> Result<(), GrammarError> {
        match rule {
            Rule::Blank => Ok(()),
            Rule::String(_) | Rule::Pattern { .. } | Rule::Token(_) => {
                let term = self.intern_inline_terminal(owner, rule)?;
                out.push(SymRef::T(term));
                Ok(())
            }
            Rule::Symbol(name) => match self.kind_of(name) {
                Some(RuleKind::Terminal(term)) => {
                    out.push(SymRef::T(term));
                    Ok(())
                }
                Some(RuleKind::Nonterminal(nt)) => {
                    out.push(SymRef::N(nt));
                    Ok(())
                }
                None => Err(GrammarError::Undeclared {
                    rule: owner.to_string(),
                    symbol: name.clone(),
                }),
            },
            Rule::Seq(members) => {
                for member in members {
                    self.expand_seq(owner, member, out)?;
                }
                Ok(())
            }
            Rule::Choice(members) => {
                let aux = self.fresh_aux(owner, "alt");
                for member in members {
                    let mut ann = Ann::default();
                    let member = strip_prec(member, &mut ann);
                    let mut rhs = Vec::new();
                    self.expand_seq(owner, member, &mut rhs)?;
                    self.productions.push(FlatProduction {
                        lhs: aux,
                        rhs,
                        prec: ann.prec,
                        assoc: ann.assoc,
                        dynamic_prec: ann.dynamic_prec,
                    });
                }
                out.push(SymRef::N(aux));
                Ok(())
            }
            Rule::Repeat(content) => {
                let aux = self.repeat_aux(owner, content, false)?;
                out.push(SymRef::N(aux));
                Ok(())
            }
            Rule::Repeat1(content) => {
                let aux = self.repeat_aux(owner, content, true)?;
                out.push(SymRef::N(aux));
                Ok(())
            }
            Rule::Prec { .. }
            | Rule::PrecLeft { .. }
            | Rule::PrecRight { .. }
            | Rule::PrecDynamic { .. } => {
                // Precedence deep inside a sequence still has to influence
                // conflict resolution, so the annotated content gets its
                // own auxiliary rule carrying the annotation.
                let mut ann = Ann::default();
                let inner = strip_prec(rule, &mut ann);
                let aux = self.fresh_aux(owner, "prec");
                let mut rhs = Vec::new();
                self.expand_seq(owner, inner, &mut rhs)?;
                self.productions.push(FlatProduction {
                    lhs: aux,
                    rhs,
                    prec: ann.prec,
                    assoc: ann.assoc,
                    dynamic_prec: ann.dynamic_prec,
                });
                out.push(SymRef::N(aux));
                Ok(())
            }
        }
    }

    /// Left-recursive repetition: `aux := (content) | aux (content)`, with
    /// an epsilon alternative when zero repetitions are allowed. Hidden, so
    /// the repetition is flat in the parent node.
    fn repeat_aux(
        &mut self,
        owner: &str,
        content: &Rule,
        at_least_one: bool,
    ) -> Result<NtIndex, GrammarError> {
        let aux = self.fresh_aux(owner, "rep");

        let mut unit = Vec::new();
        self.expand_seq(owner, content, &mut unit)?;

        if at_least_one {
            self.productions.push(FlatProduction {
                lhs: aux,
                rhs: unit.clone(),
                prec: 0,
                assoc: Assoc::None,
                dynamic_prec: 0,
            });
        } else {
            self.productions.push(FlatProduction {
                lhs: aux,
                rhs: Vec::new(),
                prec: 0,
                assoc: Assoc::None,
                dynamic_prec: 0,
            });
        }

        let mut recursive = vec![SymRef::N(aux)];
        recursive.extend(unit);
        self.productions.push(FlatProduction {
            lhs: aux,
            rhs: recursive,
            prec: 0,
            assoc: Assoc::None,
            dynamic_prec: 0,
        });
        Ok(aux)
    }

    fn fresh_aux(&mut self, owner: &str, tag: &str) -> NtIndex {
        let index = self.nonterminals.len();
        let name = format!("_{owner}_{tag}{}", self.aux_counter);
        self.aux_counter += 1;
        self.nonterminals.push(NonterminalSpec {
            name,
            visible: false,
            conflict_name: owner.to_string(),
        });
        index
    }

    /// Intern an inline terminal (literal, pattern, or token construct),
    /// deduplicating by matcher. An inline literal identical to a named
    /// token rule reuses that rule's terminal.
    fn intern_inline_terminal(
        &mut self,
        owner: &str,
        rule: &Rule,
    ) -> Result<TermIndex, GrammarError> {
        let matcher = inline_token_matcher(owner, rule)?;
        if let Some(&existing) = self.terminal_index.get(&matcher) {
            return Ok(existing);
        }

        let name = match &matcher {
            FlatMatcher::Literal(text) => text.clone(),
            FlatMatcher::Pattern(pattern) => pattern.clone(),
            FlatMatcher::End | FlatMatcher::External(_) => unreachable!("inline matchers only"),
        };
        let index = self.terminals.len();
        self.terminals.push(TerminalSpec {
            name,
            named: false,
            extra: false,
            matcher: matcher.clone(),
        });
        self.terminal_index.insert(matcher, index);
        Ok(index)
    }
}

fn strip_prec<'r>(rule: &'r Rule, ann: &mut Ann) -> &'r Rule {
    match rule {
        Rule::Prec { value, content } => {
            ann.prec = *value;
            strip_prec(content, ann)
        }
        Rule::PrecLeft { value, content } => {
            ann.prec = *value;
            ann.assoc = Assoc::Left;
            strip_prec(content, ann)
        }
        Rule::PrecRight { value, content } => {
            ann.prec = *value;
            ann.assoc = Assoc::Right;
            strip_prec(content, ann)
        }
        Rule::PrecDynamic { value, content } => {
            ann.dynamic_prec = *value;
            strip_prec(content, ann)
        }
        other => other,
    }
}

/// Matcher for a named token rule (`number: /[0-9]+/`).
fn named_token_matcher(name: &str, body: &Rule) -> Result<FlatMatcher, GrammarError> {
    matcher_for(name, body.unwrap_prec())
}

/// Matcher for an inline token occurrence.
fn inline_token_matcher(owner: &str, rule: &Rule) -> Result<FlatMatcher, GrammarError> {
    matcher_for(owner, rule.unwrap_prec())
}

fn matcher_for(rule_name: &str, body: &Rule) -> Result<FlatMatcher, GrammarError> {
    match body {
        Rule::String(text) => Ok(FlatMatcher::Literal(text.clone())),
        Rule::Pattern { value } => Ok(FlatMatcher::Pattern(value.clone())),
        Rule::Token(content) => {
            // token(...) of a bare literal stays a literal; anything
            // composite becomes a single regex.
            match content.unwrap_prec() {
                Rule::String(text) => Ok(FlatMatcher::Literal(text.clone())),
                other => Ok(FlatMatcher::Pattern(render_regex(rule_name, other)?)),
            }
        }
        _ => unreachable!("callers check is_terminal_body"),
    }
}

/// Render a token construct to a single regex.
fn render_regex(rule_name: &str, rule: &Rule) -> Result<String, GrammarError> {
    match rule {
        Rule::Blank => Ok(String::new()),
        Rule::String(text) => Ok(regex_syntax::escape(text)),
        Rule::Pattern { value } => Ok(format!("(?:{value})")),
        Rule::Seq(members) => {
            let mut rendered = String::new();
            for member in members {
                rendered.push_str(&render_regex(rule_name, member)?);
            }
            Ok(rendered)
        }
        Rule::Choice(members) => {
            let parts: Result<Vec<_>, _> = members
                .iter()
                .map(|m| render_regex(rule_name, m))
                .collect();
            Ok(format!("(?:{})", parts?.join("|")))
        }
        Rule::Repeat(content) => Ok(format!("(?:{})*", render_regex(rule_name, content)?)),
        Rule::Repeat1(content) => Ok(format!("(?:{})+", render_regex(rule_name, content)?)),
        Rule::Token(content) => render_regex(rule_name, content),
        Rule::Prec { content, .. }
        | Rule::PrecLeft { content, .. }
        | Rule::PrecRight { content, .. }
        | Rule::PrecDynamic { content, .. } => render_regex(rule_name, content),
        Rule::Symbol(name) => Err(GrammarError::InvalidPattern {
            rule: rule_name.to_string(),
            message: format!("token content cannot reference rule `{name}`"),
        }),
    }
}
