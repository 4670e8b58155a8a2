//! The pushdown automaton shared by the DMR and JSON dialects. Readers
//! and writers for both text grammars drive the same stack of frames so
//! container nesting, comma/colon placement, and single-child PROPERTY
//! enforcement are checked in exactly one place.

use log::trace;

use crate::error::ModelError;

/// One open container (or open PROPERTY association) on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    List { count: u32 },
    Object { count: u32, awaiting_value: bool },
    Property { has_name: bool, has_child: bool },
}

/// Events a reader or writer reports as it walks a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    StartList,
    EndList,
    StartObject,
    EndObject,
    StartProperty,
    EndProperty,
    /// An OBJECT key, or a PROPERTY's name.
    Key,
    /// Any scalar leaf (undefined, boolean, number, string, bytes, type).
    Scalar,
}

/// Tracks nesting state for one document. `before(event)` must be called
/// before emitting/consuming `event`'s token(s); it validates placement
/// and returns whether a separator (comma) is needed first.
#[derive(Debug, Default)]
pub struct Grammar {
    stack: Vec<Frame>,
    done: bool,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    fn top_mut(&mut self) -> Option<&mut Frame> {
        self.stack.last_mut()
    }

    fn expecting(&self, what: &str) -> ModelError {
        ModelError::Grammar(format!("expecting {what}"))
    }

    /// Call before handling `event`. Returns `true` if a comma separator
    /// must be written/consumed first.
    pub fn before(&mut self, event: Event) -> Result<bool, ModelError> {
        if self.done {
            return Err(self.expecting("end of input"));
        }
        let mut need_comma = false;
        match self.stack.last_mut() {
            None => {
                if matches!(event, Event::EndList | Event::EndObject | Event::EndProperty | Event::Key) {
                    return Err(self.expecting("a value"));
                }
            }
            Some(Frame::List { count }) => {
                if matches!(event, Event::Key) {
                    return Err(self.expecting("a value, not a key"));
                }
                if event == Event::EndList {
                    // closing is always allowed, even with count == 0
                } else {
                    need_comma = *count > 0;
                }
            }
            Some(Frame::Object { count, awaiting_value }) => {
                if *awaiting_value {
                    if matches!(event, Event::Key | Event::EndObject) {
                        return Err(self.expecting("a value"));
                    }
                } else if event == Event::EndObject {
                    // closing allowed at any count
                } else if event != Event::Key {
                    return Err(self.expecting("a key"));
                } else {
                    need_comma = *count > 0;
                }
            }
            Some(Frame::Property { has_name, has_child }) => {
                if event == Event::Key {
                    if *has_name {
                        return Err(self.expecting("end of property, not another key"));
                    }
                } else if event == Event::EndProperty {
                    if !*has_name || !*has_child {
                        return Err(self.expecting("a value"));
                    }
                } else if !*has_name {
                    return Err(self.expecting("a property name"));
                } else if *has_child {
                    return Err(self.expecting("end of property"));
                }
            }
        }
        Ok(need_comma)
    }

    /// Call after `before(event)` succeeded and the token(s) for `event`
    /// have been handled, to advance the automaton's state.
    pub fn after(&mut self, event: Event) -> Result<(), ModelError> {
        trace!("grammar: {event:?} at depth {}", self.stack.len());
        match event {
            Event::StartList => self.stack.push(Frame::List { count: 0 }),
            Event::StartObject => self.stack.push(Frame::Object {
                count: 0,
                awaiting_value: false,
            }),
            Event::StartProperty => self.stack.push(Frame::Property {
                has_name: false,
                has_child: false,
            }),
            Event::EndList => {
                match self.stack.pop() {
                    Some(Frame::List { .. }) => {}
                    _ => return Err(self.expecting("a list to close")),
                }
                self.mark_child_complete();
            }
            Event::EndObject => {
                match self.stack.pop() {
                    Some(Frame::Object { .. }) => {}
                    _ => return Err(self.expecting("an object to close")),
                }
                self.mark_child_complete();
            }
            Event::EndProperty => {
                match self.stack.pop() {
                    Some(Frame::Property { .. }) => {}
                    _ => return Err(self.expecting("a property to close")),
                }
                self.mark_child_complete();
            }
            Event::Key => match self.top_mut() {
                Some(Frame::Object { awaiting_value, .. }) => *awaiting_value = true,
                Some(Frame::Property { has_name, .. }) => *has_name = true,
                _ => return Err(self.expecting("an open object or property")),
            },
            Event::Scalar => self.mark_child_complete(),
        }
        if self.stack.is_empty()
            && !matches!(
                event,
                Event::StartList | Event::StartObject | Event::StartProperty | Event::Key
            )
        {
            self.done = true;
        }
        Ok(())
    }

    /// Called after a complete value was just closed at the top of the
    /// stack (a scalar, or the matching End* of a container/property
    /// that was itself that value). Advances the parent's bookkeeping.
    fn mark_child_complete(&mut self) {
        match self.top_mut() {
            Some(Frame::List { count }) => *count += 1,
            Some(Frame::Object { count, awaiting_value }) => {
                *awaiting_value = false;
                *count += 1;
            }
            Some(Frame::Property { has_child, .. }) => *has_child = true,
            None => {}
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(g: &mut Grammar, event: Event) -> Result<bool, ModelError> {
        let need_comma = g.before(event)?;
        g.after(event)?;
        Ok(need_comma)
    }

    #[test]
    fn single_scalar_document_completes() {
        let mut g = Grammar::new();
        step(&mut g, Event::Scalar).unwrap();
        assert!(g.is_done());
    }

    #[test]
    fn list_tracks_commas_between_elements() {
        let mut g = Grammar::new();
        step(&mut g, Event::StartList).unwrap();
        assert!(!step(&mut g, Event::Scalar).unwrap());
        assert!(step(&mut g, Event::Scalar).unwrap());
        step(&mut g, Event::EndList).unwrap();
        assert!(g.is_done());
    }

    #[test]
    fn empty_list_and_object_close_immediately() {
        let mut g = Grammar::new();
        step(&mut g, Event::StartList).unwrap();
        step(&mut g, Event::EndList).unwrap();
        assert!(g.is_done());

        let mut g = Grammar::new();
        step(&mut g, Event::StartObject).unwrap();
        step(&mut g, Event::EndObject).unwrap();
        assert!(g.is_done());
    }

    #[test]
    fn object_requires_key_before_value() {
        let mut g = Grammar::new();
        step(&mut g, Event::StartObject).unwrap();
        assert!(g.before(Event::Scalar).is_err());
    }

    #[test]
    fn object_key_then_value_then_comma_then_key() {
        let mut g = Grammar::new();
        step(&mut g, Event::StartObject).unwrap();
        assert!(!step(&mut g, Event::Key).unwrap());
        step(&mut g, Event::Scalar).unwrap();
        assert!(step(&mut g, Event::Key).unwrap());
        step(&mut g, Event::Scalar).unwrap();
        step(&mut g, Event::EndObject).unwrap();
        assert!(g.is_done());
    }

    #[test]
    fn property_accepts_exactly_one_child() {
        let mut g = Grammar::new();
        step(&mut g, Event::StartProperty).unwrap();
        step(&mut g, Event::Key).unwrap();
        step(&mut g, Event::Scalar).unwrap();
        assert!(g.before(Event::Scalar).is_err());
        step(&mut g, Event::EndProperty).unwrap();
        assert!(g.is_done());
    }

    #[test]
    fn property_rejects_closing_with_no_child() {
        let mut g = Grammar::new();
        step(&mut g, Event::StartProperty).unwrap();
        step(&mut g, Event::Key).unwrap();
        assert!(g.before(Event::EndProperty).is_err());
    }

    #[test]
    fn nested_containers_compose() {
        let mut g = Grammar::new();
        step(&mut g, Event::StartObject).unwrap();
        step(&mut g, Event::Key).unwrap();
        step(&mut g, Event::StartList).unwrap();
        step(&mut g, Event::Scalar).unwrap();
        step(&mut g, Event::Scalar).unwrap();
        step(&mut g, Event::EndList).unwrap();
        step(&mut g, Event::EndObject).unwrap();
        assert!(g.is_done());
    }

    #[test]
    fn nothing_permitted_after_document_completes() {
        let mut g = Grammar::new();
        step(&mut g, Event::Scalar).unwrap();
        assert!(g.before(Event::Scalar).is_err());
    }
}
