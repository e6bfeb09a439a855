use crate::schema::DomainType;
use snafu::{ErrorCompat, IntoError, Snafu};
use surf::StatusCode;

/// Errors raised by a single encode or decode call.
///
/// All of them are fatal to the call that raised them. The marshalers never log, retry or
/// suppress them; that policy belongs to the caller.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MarshalError {
    /// A concrete type was demanded for a tag the registry does not know.
    #[snafu(display("unresolvable type tag {:?}", tag))]
    UnresolvableType { tag: String },

    /// A value whose shape does not fit its tag, or that the wire format cannot represent.
    #[snafu(display("cannot marshal {}: {}", value, reason))]
    UnmarshalableValue { value: String, reason: String },

    /// Input lacks the structure required by the tag it claims.
    #[snafu(display("malformed {} value: {}", tag, reason))]
    MalformedEnvelope { tag: String, reason: String },

    #[snafu(display("invalid JSON document: {}", source))]
    JsonSyntax { source: serde_json::Error },

    #[snafu(display("invalid XML document: {}", message))]
    XmlSyntax { message: String },
}

pub(crate) fn malformed(tag: &str, reason: impl Into<String>) -> MarshalError {
    MalformedEnvelopeSnafu {
        tag,
        reason: reason.into(),
    }
    .build()
}

pub(crate) fn unmarshalable(value: impl std::fmt::Debug, reason: impl Into<String>) -> MarshalError {
    UnmarshalableValueSnafu {
        value: format!("{:?}", value),
        reason: reason.into(),
    }
    .build()
}

/// Errors which can be produced by a Platform API call.
///
/// This trait can be used to define a standard error type for a client of the Platform. When a
/// request fails for any reason, the failure travels through `surf` as a [surf::Error]. If the
/// failure was produced by the [parse_error_body](crate::client::parse_error_body) middleware it
/// downcasts to the API's error type; anything else (connection failures, errors generated inside
/// `surf` itself) is converted to a string using its [Display](std::fmt::Display) instance and
/// wrapped using `catch_all`.
pub trait ApiError: std::error::Error + Send + Sync + 'static {
    fn catch_all(status: StatusCode, msg: String) -> Self;
    fn status(&self) -> StatusCode;

    /// Convert from a generic client-side error to a specific error type.
    ///
    /// If `source` can be downcast to `Self`, it is simply downcasted. Otherwise, it is converted
    /// to a [String] using [Display](std::fmt::Display) and then converted to `Self` using
    /// [catch_all](ApiError::catch_all).
    fn from_client_error(source: surf::Error) -> Self
    where
        Self: Sized,
    {
        let status = source.status();
        match source.downcast::<Self>() {
            Ok(err) => err,
            Err(err) => Self::catch_all(status, err.to_string()),
        }
    }
}

/// Context for embedding network client errors into specific error types.
///
/// This type implements the [IntoError] trait from SNAFU, so it can be used with
/// [ResultExt::context](snafu::ResultExt::context) just like automatically generated SNAFU
/// contexts.
///
/// Calling `some_result.context(ClientError)` will convert a potential error from a [surf::Error]
/// to a specific error type `E` using the method `E::from_client_error`, provided by the
/// [ApiError] trait.
pub struct ClientError;

impl<E: ApiError + ErrorCompat + std::error::Error> IntoError<E> for ClientError {
    type Source = surf::Error;

    fn into_error(self, source: Self::Source) -> E {
        E::from_client_error(source)
    }
}

/// Convert a concrete error type into a client error.
///
/// The error is first converted into an [ApiError] using the [Into] instance. That error is then
/// upcasted into an anyhow error to be embedded in the [surf::Error], where
/// [ApiError::from_client_error] can find it again.
pub fn client_error<E: ApiError>(error: impl Into<E>) -> surf::Error {
    let error = error.into();
    surf::Error::new(error.status(), error)
}

/// The error type of the Platform client.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FlowError {
    #[snafu(display("{}", source))]
    Marshal { source: MarshalError },

    #[snafu(display("{} has no field named {:?}", ty, field))]
    UnknownField { ty: DomainType, field: String },

    #[snafu(display("{} has not been persisted yet", ty))]
    MissingUid { ty: DomainType },

    #[snafu(display("platform rejected the request ({}): {}", status, errors.join("; ")))]
    Platform {
        status: StatusCode,
        errors: Vec<String>,
    },

    #[snafu(display("request failed ({}): {}", status, message))]
    Transport { status: StatusCode, message: String },

    #[snafu(display("invalid client configuration: {}", message))]
    Config { message: String },
}

impl From<MarshalError> for FlowError {
    fn from(source: MarshalError) -> Self {
        FlowError::Marshal { source }
    }
}

impl ApiError for FlowError {
    fn catch_all(status: StatusCode, message: String) -> Self {
        FlowError::Transport { status, message }
    }

    fn status(&self) -> StatusCode {
        match self {
            FlowError::Platform { status, .. } | FlowError::Transport { status, .. } => *status,
            FlowError::Marshal { .. } => StatusCode::UnprocessableEntity,
            FlowError::UnknownField { .. } | FlowError::MissingUid { .. } => {
                StatusCode::BadRequest
            }
            FlowError::Config { .. } => StatusCode::InternalServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snafu::ResultExt;

    #[test]
    fn client_errors_downcast_back() {
        let original = FlowError::Platform {
            status: StatusCode::NotFound,
            errors: vec!["no such flow".into()],
        };
        let wire = client_error::<FlowError>(original);
        assert_eq!(wire.status(), StatusCode::NotFound);

        let result: Result<(), surf::Error> = Err(wire);
        match result.context(ClientError) {
            Err(FlowError::Platform { status, errors }) => {
                assert_eq!(status, StatusCode::NotFound);
                assert_eq!(errors, vec!["no such flow".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn foreign_errors_become_transport_errors() {
        let wire = surf::Error::from_str(StatusCode::BadGateway, "upstream went away");
        let err = FlowError::from_client_error(wire);
        assert_eq!(err.status(), StatusCode::BadGateway);
        assert!(matches!(err, FlowError::Transport { ref message, .. } if message.contains("upstream")));
    }

    #[test]
    fn marshal_errors_display_their_tag() {
        let err = malformed("map", "expected an object");
        assert_eq!(err.to_string(), "malformed map value: expected an object");
        let err: FlowError = err.into();
        assert_eq!(err.status(), StatusCode::UnprocessableEntity);
    }
}
