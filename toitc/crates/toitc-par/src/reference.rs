//! Toitdoc cross-reference parsing.
//!
//! The toitdoc parser hands `$identifier`, `$operator`, and `$(signature)`
//! references back to the main parser through these entry points. Keywords
//! are not special here (the scanner runs in its normal mode but the
//! grammar only admits identifiers and operator spellings), and all
//! diagnostics surface at warning severity through the toitdoc path.

use toitc_lex::Token;

use crate::ast::*;
use crate::items::is_operator_token;
use crate::{eol_range, is_eol, Parser};

impl<'a> Parser<'a> {
    /// Parses a toitdoc reference.
    ///
    /// Returns the reference and the end offset (position in the scanned
    /// source) of the consumed text.
    pub fn parse_toitdoc_reference(&mut self) -> (ToitdocReference, usize) {
        if self.current_token() == Token::Lparen {
            self.parse_toitdoc_signature_reference()
        } else {
            self.parse_toitdoc_identifier_reference()
        }
    }

    /// `target['=']` where target is a dotted name or an operator spelling.
    pub(crate) fn parse_toitdoc_identifier_reference(&mut self) -> (ToitdocReference, usize) {
        let mut encountered_error = false;
        let mut target: Option<Expression> = None;
        let mut node_range = self.current_range();
        let mut is_operator = false;
        let mut end_offset = 0usize;
        loop {
            let token = self.current_token();
            end_offset = self.current_state().scanner_state.to as usize;

            if token == Token::Illegal {
                debug_assert!(target.is_none());
                // Only happens when the character after a '.' was an LSP
                // marker that didn't turn out to be a selection.
                self.report_error_here("Error while parsing identifier");
                encountered_error = true;
                break;
            }

            is_operator = is_operator_token(token);
            if token != Token::Identifier && !is_operator {
                debug_assert!(target.is_none());
                self.report_error_here("Expected identifier or operator as toitdoc target");
                encountered_error = true;
                break;
            }

            let id;
            if is_operator {
                let operator = token;
                let mut operator_range = self.current_range();
                self.consume();
                if operator != Token::Lbrack {
                    id = Identifier::new(operator.symbol(), operator_range);
                } else if self.current_token() != Token::Rbrack {
                    self.report_error(operator_range, "Missing closing ']'");
                    id = Identifier::new(operator.symbol(), operator_range);
                } else {
                    // Either `[]` or `[]=`.
                    if !self.is_current_token_attached() {
                        self.report_error_here("Can't have space between '[' and ']'");
                    }
                    operator_range = operator_range.extend(self.current_range());
                    end_offset = self.current_state().scanner_state.to as usize;
                    self.consume();
                    if self.current_token() == Token::Assign {
                        if !self.is_current_token_attached() {
                            self.report_error_here("Can't have space between ']' and '='");
                        }
                        operator_range = operator_range.extend(self.current_range());
                        end_offset = self.current_state().scanner_state.to as usize;
                        self.consume();
                        id = Identifier::new(toitc_util::symbols::INDEX_PUT, operator_range);
                    } else {
                        id = Identifier::new(toitc_util::symbols::INDEX, operator_range);
                    }
                }
            } else {
                id = self.parse_identifier();
            }
            target = Some(match target {
                None => Expression::identifier(id),
                Some(receiver) => {
                    let dot_range = receiver.range().extend(id.range);
                    Expression::Dot(Box::new(Dot { receiver, name: id, range: dot_range }))
                }
            });
            if is_operator {
                break;
            }
            if !self.is_current_token_attached() {
                break;
            }
            if self.current_token() != Token::Period {
                break;
            }
            if !self.is_next_token_attached() {
                break;
            }
            let next = self.peek_token();
            if next != Token::Identifier && !is_operator_token(next) {
                break;
            }
            self.consume(); // The period.
        }

        let mut is_setter = false;
        let target = if encountered_error {
            // The error wins over anything already parsed.
            Expression::Error(Error { range: self.current_range() })
        } else {
            let target = target.expect("loop either sets the target or errors");
            if !is_operator
                && self.is_current_token_attached()
                && self.current_token() == Token::Assign
            {
                // Found a setter.
                node_range = node_range.extend(self.current_range());
                end_offset = self.current_state().scanner_state.to as usize;
                self.consume();
                is_setter = true;
            }
            target
        };
        // For setters the range was already extended past the target range,
        // so this extend has no effect there.
        node_range = node_range.extend(target.range());
        (
            ToitdocReference {
                is_signature_reference: false,
                target,
                is_setter,
                parameters: Vec::new(),
                range: node_range,
            },
            end_offset,
        )
    }

    /// `(name parameter*)` where each parameter may be `[name]` for a
    /// block or `--name` for a named parameter.
    pub(crate) fn parse_toitdoc_signature_reference(&mut self) -> (ToitdocReference, usize) {
        let open_range = self.current_range();

        debug_assert!(self.current_token() == Token::Lparen);
        self.consume();

        let mut encountered_error = false;

        let mut is_first = true;
        let mut target: Option<Expression> = None;
        let mut is_target_setter = false;
        let mut parameters = Vec::new();
        let mut end_offset = 0usize;
        loop {
            if is_eol(self.current_token()) && is_first {
                let previous = self.previous_range();
                let current = self.current_range();
                self.report_error(eol_range(previous, current), "Incomplete toitdoc reference");
                encountered_error = true;
                break;
            }
            if self.current_token() == Token::Illegal {
                let previous = self.previous_range();
                let current = self.current_range();
                self.report_error(
                    eol_range(previous, current),
                    "Illegal token while parsing toitdoc reference",
                );
                encountered_error = true;
                break;
            }
            if is_first {
                is_first = false;
                let (parsed, parsed_end) = self.parse_toitdoc_identifier_reference();
                end_offset = parsed_end;
                is_target_setter = parsed.is_setter;
                let is_error = parsed.is_error();
                target = Some(parsed.target);
                if is_error {
                    encountered_error = true;
                    break;
                }
                continue;
            }

            if self.current_token() == Token::Rparen {
                break;
            }

            let range_start = self.current_range();

            let mut is_block = false;
            if self.current_token() == Token::Lbrack {
                is_block = true;
                self.consume();
            }

            let mut is_named = false;
            if self.current_token() == Token::Decrement {
                self.consume();
                is_named = true;
                // An unattached non-identifier produces a different error
                // below.
                if !self.is_current_token_attached() && self.current_token() == Token::Identifier {
                    self.report_error_here("Can't have space between '--' and the parameter name");
                    encountered_error = true;
                    break;
                }
            }

            if self.current_token() != Token::Identifier {
                if is_named || is_block {
                    self.report_error_here("Missing parameter name");
                    encountered_error = true;
                } else {
                    self.report_error_here("Missing parameter name or closing ')'");
                    // With nothing following, assume the user hasn't
                    // finished writing the comment yet.
                    encountered_error = self.current_token() != Token::Eos;
                }
                break;
            }
            let name = self.parse_identifier();

            if is_block {
                if self.current_token() != Token::Rbrack {
                    self.report_error_here("Missing ']' for block parameter");
                    encountered_error = true;
                    break;
                }
                self.consume();
            }
            let parameter_range = range_start.extend(self.current_range());
            parameters.push(Parameter {
                name,
                type_annotation: None,
                default_value: None,
                is_named,
                is_field_storing: false,
                is_block,
                range: parameter_range,
            });
        }

        // Either at the closing parenthesis or at an error token; in both
        // cases the current token counts as part of the reference.
        end_offset = self.current_state().scanner_state.to as usize;

        let target = if target.is_none() || encountered_error {
            Expression::Error(Error { range: self.current_range() })
        } else {
            target.expect("checked above")
        };
        let range = open_range.extend(self.current_range());
        (
            ToitdocReference {
                is_signature_reference: true,
                target,
                is_setter: is_target_setter,
                parameters,
                range,
            },
            end_offset,
        )
    }
}
