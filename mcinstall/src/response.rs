//! Response classification.
//!
//! Every response carries a `Status` envelope. `Acknowledged` is success,
//! `Error` is a rejection explained by an optional `ErrorChain`, and any
//! other well-formed status is a bare rejection. A response that is not a
//! dictionary, or lacks a string `Status`, breaks the wire contract and is
//! reported as [`Error::MalformedResponse`] instead.

use mcinstall_proto::{Dictionary, Value, keys, status};

use crate::{Error, Result};

/// Classifies a decoded response.
///
/// On success, returns the response body with the `Status` envelope removed.
pub fn classify(response: Value) -> Result<Dictionary> {
    let Value::Dictionary(mut body) = response else {
        return Err(Error::MalformedResponse("response is not a dictionary".into()));
    };

    let Some(Value::String(reported)) = body.remove(keys::STATUS) else {
        return Err(Error::MalformedResponse(
            "missing or non-string Status field".into(),
        ));
    };

    match reported.as_str() {
        status::ACKNOWLEDGED => Ok(body),
        status::ERROR => Err(Error::RequestFailed {
            diagnostics: error_chain(&body),
            status: reported,
        }),
        _ => Err(Error::RequestFailed {
            status: reported,
            diagnostics: Vec::new(),
        }),
    }
}

/// Extracts the localized descriptions of an `ErrorChain`, in array order.
///
/// A missing or non-array chain yields nothing; entries that are not
/// dictionaries or have no string description are skipped.
pub fn error_chain(body: &Dictionary) -> Vec<String> {
    body.get(keys::ERROR_CHAIN)
        .and_then(Value::as_array)
        .map(|chain| {
            chain
                .iter()
                .filter_map(Value::as_dictionary)
                .filter_map(|entry| entry.get(keys::LOCALIZED_DESCRIPTION))
                .filter_map(Value::as_string)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn response(entries: Vec<(&str, Value)>) -> Value {
        let mut dict = Dictionary::new();
        for (k, v) in entries {
            dict.insert(k.into(), v);
        }
        Value::Dictionary(dict)
    }

    fn described(text: &str) -> Value {
        response(vec![(keys::LOCALIZED_DESCRIPTION, Value::String(text.into()))])
    }

    fn status_field(s: &str) -> (&'static str, Value) {
        (keys::STATUS, Value::String(s.into()))
    }

    #[test]
    fn acknowledged_strips_envelope() {
        let body = classify(response(vec![
            status_field("Acknowledged"),
            (keys::ORDERED_IDENTIFIERS, Value::Array(vec![])),
        ]))
        .unwrap();
        assert!(body.get(keys::STATUS).is_none());
        assert!(body.get(keys::ORDERED_IDENTIFIERS).is_some());
    }

    #[test]
    fn non_dictionary_is_malformed() {
        let err = classify(Value::Array(vec![])).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn missing_status_is_malformed() {
        let err = classify(response(vec![])).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn non_string_status_is_malformed() {
        let err = classify(response(vec![(keys::STATUS, Value::Boolean(true))])).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn error_chain_descriptions_in_order() {
        let err = classify(response(vec![
            status_field("Error"),
            (
                keys::ERROR_CHAIN,
                Value::Array(vec![
                    described("The profile is not signed."),
                    described("Profile installation failed."),
                    described("Try again."),
                ]),
            ),
        ]))
        .unwrap_err();
        match err {
            Error::RequestFailed {
                status,
                diagnostics,
            } => {
                assert_eq!(status, "Error");
                assert_eq!(
                    diagnostics,
                    [
                        "The profile is not signed.",
                        "Profile installation failed.",
                        "Try again."
                    ]
                );
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }

    #[test]
    fn malformed_chain_entries_are_skipped() {
        let err = classify(response(vec![
            status_field("Error"),
            (
                keys::ERROR_CHAIN,
                Value::Array(vec![
                    Value::String("not a record".into()),
                    response(vec![("ErrorCode", Value::Integer(4001_i64.into()))]),
                    response(vec![(keys::LOCALIZED_DESCRIPTION, Value::Boolean(false))]),
                    described("kept"),
                ]),
            ),
        ]))
        .unwrap_err();
        assert_eq!(err.diagnostics(), ["kept"]);
        assert_eq!(err.code(), -4);
    }

    #[test]
    fn error_without_chain_still_request_failed() {
        let err = classify(response(vec![status_field("Error")])).unwrap_err();
        assert!(matches!(err, Error::RequestFailed { .. }));
        assert!(err.diagnostics().is_empty());

        let err = classify(response(vec![
            status_field("Error"),
            (keys::ERROR_CHAIN, Value::String("oops".into())),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::RequestFailed { .. }));
        assert!(err.diagnostics().is_empty());
    }

    #[test]
    fn unrecognized_status_is_bare_rejection() {
        let err = classify(response(vec![
            status_field("Busy"),
            (keys::ERROR_CHAIN, Value::Array(vec![described("ignored")])),
        ]))
        .unwrap_err();
        match err {
            Error::RequestFailed {
                status,
                diagnostics,
            } => {
                assert_eq!(status, "Busy");
                assert!(diagnostics.is_empty());
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }
}
