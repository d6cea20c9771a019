//! Distinguished name tokenizer.
//!
//! A single pass over the characters of the name, driven by [`transition`].
//! The scanner accepts `type=value` attributes separated by `,`, `/` or `;`;
//! a separator may also end the name. A `+` joins the next attribute to the previous one in a multivalued RDN,
//! and `\` escapes the next character wherever it appears.

use pki_logger::debug;

use crate::{PkiResult, pki_bail, pki_ensure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    SeekAttribute,
    /// Right after a separator, where the input may end
    AfterSeparator,
    InAttributeType,
    AfterEscapeInType,
    InAttributeValue,
    AfterEscapeInValue,
}

/// What the scanner does with the current character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanAction {
    Skip,
    /// The attribute being opened joins the previous RDN
    MarkMultivalued,
    PushType(char),
    PushValue(char),
    /// Register the attribute and look for the next one
    Emit,
    /// Register the attribute; the next one joins it in the same RDN
    EmitAndJoin,
    /// Register the attribute and stop: the input is exhausted
    Finish,
    /// Stop with nothing left to register
    End,
    Fail(&'static str),
}

/// A `type=value` pair as it appears in the text, escapes removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameToken {
    pub type_text: String,
    pub value: String,
    pub multivalued: bool,
}

const fn is_separator(c: char) -> bool {
    matches!(c, ',' | '/' | ';')
}

/// The scanner transition function. `None` stands for the end of the input.
#[must_use]
pub const fn transition(state: ScanState, c: Option<char>) -> (ScanState, ScanAction) {
    match state {
        ScanState::SeekAttribute => match c {
            None => (state, ScanAction::Fail("no attribute")),
            Some(' ') => (state, ScanAction::Skip),
            Some('+') => (state, ScanAction::MarkMultivalued),
            Some('=') => (state, ScanAction::Fail("attribute without type")),
            Some('\\') => (ScanState::AfterEscapeInType, ScanAction::Skip),
            Some(c) if is_separator(c) => (state, ScanAction::Fail("empty attribute")),
            Some(c) => (ScanState::InAttributeType, ScanAction::PushType(c)),
        },
        ScanState::AfterSeparator => match c {
            None => (state, ScanAction::End),
            Some(' ') => (state, ScanAction::Skip),
            _ => transition(ScanState::SeekAttribute, c),
        },
        ScanState::InAttributeType => match c {
            None => (state, ScanAction::Fail("attribute type without value")),
            Some('\\') => (ScanState::AfterEscapeInType, ScanAction::Skip),
            Some('=') => (ScanState::InAttributeValue, ScanAction::Skip),
            Some(c) if is_separator(c) => {
                (state, ScanAction::Fail("attribute type without value"))
            }
            Some(c) => (state, ScanAction::PushType(c)),
        },
        ScanState::AfterEscapeInType => match c {
            None => (state, ScanAction::Fail("dangling escape")),
            Some(c) => (ScanState::InAttributeType, ScanAction::PushType(c)),
        },
        ScanState::InAttributeValue => match c {
            None => (state, ScanAction::Finish),
            Some('\\') => (ScanState::AfterEscapeInValue, ScanAction::Skip),
            Some('+') => (ScanState::SeekAttribute, ScanAction::EmitAndJoin),
            Some(c) if is_separator(c) => (ScanState::AfterSeparator, ScanAction::Emit),
            Some(c) => (state, ScanAction::PushValue(c)),
        },
        ScanState::AfterEscapeInValue => match c {
            None => (state, ScanAction::Fail("dangling escape")),
            Some(c) => (ScanState::InAttributeValue, ScanAction::PushValue(c)),
        },
    }
}

fn take_token(
    type_text: &mut String,
    value: &mut String,
    multivalued: bool,
) -> PkiResult<NameToken> {
    let token = NameToken {
        type_text: type_text.trim().to_owned(),
        value: value.trim().to_owned(),
        multivalued,
    };
    type_text.clear();
    value.clear();
    pki_ensure!(
        !token.value.is_empty(),
        MalformedName,
        "attribute {} has no value",
        token.type_text
    );
    Ok(token)
}

/// Scan `input`, handing every attribute to `sink` in source order.
/// The first error, from the scanner or from the sink, stops the scan.
pub fn scan<F>(input: &str, mut sink: F) -> PkiResult<()>
where
    F: FnMut(NameToken) -> PkiResult<()>,
{
    let mut state = ScanState::SeekAttribute;
    let mut type_text = String::new();
    let mut value = String::new();
    let mut multivalued = false;
    let mut chars = input.chars();
    loop {
        let (next, action) = transition(state, chars.next());
        match action {
            ScanAction::Skip => {}
            ScanAction::MarkMultivalued => multivalued = true,
            ScanAction::PushType(c) => type_text.push(c),
            ScanAction::PushValue(c) => value.push(c),
            ScanAction::Emit | ScanAction::EmitAndJoin | ScanAction::Finish => {
                sink(take_token(&mut type_text, &mut value, multivalued)?)?;
                multivalued = action == ScanAction::EmitAndJoin;
                if action == ScanAction::Finish {
                    return Ok(());
                }
            }
            ScanAction::End => return Ok(()),
            ScanAction::Fail(reason) => {
                debug!("cannot parse the name {input:?}: {reason}");
                pki_bail!(MalformedName, "{reason}: {input}");
            }
        }
        state = next;
    }
}

/// All the attributes of `input`, in source order
pub fn tokenize(input: &str) -> PkiResult<Vec<NameToken>> {
    let mut tokens = Vec::new();
    scan(input, |token| {
        tokens.push(token);
        Ok(())
    })?;
    Ok(tokens)
}

#[expect(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::{NameToken, ScanAction, ScanState, tokenize, transition};
    use crate::PkiError;

    fn token(type_text: &str, value: &str, multivalued: bool) -> NameToken {
        NameToken {
            type_text: type_text.to_owned(),
            value: value.to_owned(),
            multivalued,
        }
    }

    #[test]
    fn test_transitions() {
        use ScanState::{
            AfterEscapeInType, AfterEscapeInValue, AfterSeparator, InAttributeType,
            InAttributeValue, SeekAttribute,
        };
        assert_eq!(
            transition(SeekAttribute, Some(' ')),
            (SeekAttribute, ScanAction::Skip)
        );
        assert_eq!(
            transition(SeekAttribute, Some('+')),
            (SeekAttribute, ScanAction::MarkMultivalued)
        );
        assert!(matches!(
            transition(SeekAttribute, Some(';')),
            (_, ScanAction::Fail(_))
        ));
        assert_eq!(
            transition(SeekAttribute, Some('C')),
            (InAttributeType, ScanAction::PushType('C'))
        );
        assert_eq!(
            transition(InAttributeType, Some('=')),
            (InAttributeValue, ScanAction::Skip)
        );
        assert!(matches!(
            transition(InAttributeType, Some(',')),
            (_, ScanAction::Fail(_))
        ));
        assert_eq!(
            transition(InAttributeType, Some('\\')),
            (AfterEscapeInType, ScanAction::Skip)
        );
        assert_eq!(
            transition(AfterEscapeInType, Some('=')),
            (InAttributeType, ScanAction::PushType('='))
        );
        assert_eq!(
            transition(InAttributeValue, Some('\\')),
            (AfterEscapeInValue, ScanAction::Skip)
        );
        assert_eq!(
            transition(AfterEscapeInValue, Some(',')),
            (InAttributeValue, ScanAction::PushValue(','))
        );
        assert_eq!(
            transition(InAttributeValue, Some('/')),
            (AfterSeparator, ScanAction::Emit)
        );
        assert_eq!(transition(AfterSeparator, None), (AfterSeparator, ScanAction::End));
        assert_eq!(
            transition(AfterSeparator, Some(' ')),
            (AfterSeparator, ScanAction::Skip)
        );
        assert_eq!(
            transition(AfterSeparator, Some('O')),
            (InAttributeType, ScanAction::PushType('O'))
        );
        assert!(matches!(
            transition(AfterSeparator, Some(',')),
            (_, ScanAction::Fail(_))
        ));
        assert_eq!(
            transition(InAttributeValue, Some('+')),
            (SeekAttribute, ScanAction::EmitAndJoin)
        );
        assert_eq!(
            transition(InAttributeValue, None),
            (InAttributeValue, ScanAction::Finish)
        );
        for state in [SeekAttribute, InAttributeType, AfterEscapeInType, AfterEscapeInValue] {
            assert!(matches!(transition(state, None), (_, ScanAction::Fail(_))));
        }
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("C=US, O=Dis;OU=Eng/CN=www.example.com").unwrap(),
            vec![
                token("C", "US", false),
                token("O", "Dis", false),
                token("OU", "Eng", false),
                token("CN", "www.example.com", false),
            ]
        );
        assert_eq!(
            tokenize("CN=John\\, Doe").unwrap(),
            vec![token("CN", "John, Doe", false)]
        );
        assert_eq!(
            tokenize("CN=Bob+OU=Eng").unwrap(),
            vec![token("CN", "Bob", false), token("OU", "Eng", true)]
        );
        assert_eq!(
            tokenize("  CN = spaced , O=x=y").unwrap(),
            vec![token("CN", "spaced", false), token("O", "x=y", false)]
        );
        assert_eq!(
            tokenize("+CN=first").unwrap(),
            vec![token("CN", "first", true)]
        );
        for input in ["CN=x,", "CN=x;", "CN=x/", "CN=x, "] {
            assert_eq!(tokenize(input).unwrap(), vec![token("CN", "x", false)], "{input:?}");
        }
    }

    #[test]
    fn test_tokenize_malformed() {
        for input in [
            "", " ", "CN", "CN,O=x", ",CN=x", "CN=x,,", "CN=x+", "CN=", "CN=x\\", "=x",
        ] {
            assert!(
                matches!(tokenize(input), Err(PkiError::MalformedName(_))),
                "{input:?} should not parse"
            );
        }
    }
}
