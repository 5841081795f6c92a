//! Protobuf types and gRPC bindings for the crypto broker.
//!
//! This crate provides the generated `cryptobroker.v1` messages together with
//! the tonic client ([`proto::crypto_broker_client`]) and server
//! ([`proto::crypto_broker_server`]) for the `CryptoBroker` service.
//!
//! The health protocol is the standard `grpc.health.v1` service and is not
//! part of this schema.

#![deny(unsafe_code)]
// gRPC services return tonic::Status (176 bytes) - standard practice for gRPC error handling
#![allow(clippy::result_large_err)]

/// Generated protobuf types and service traits.
pub mod proto {
    #![allow(clippy::all)]
    #![allow(missing_docs)]

    // Use pre-generated code when the schema or protoc isn't available
    #[cfg(use_pregenerated_proto)]
    include!("generated/cryptobroker.v1.rs");

    // Use build-time generated code in development
    #[cfg(not(use_pregenerated_proto))]
    tonic::include_proto!("cryptobroker.v1");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::disallowed_methods)]
mod tests {
    use prost::Message;

    use super::proto;

    #[test]
    fn test_sign_request_optional_fields_survive_encoding() {
        let request = proto::SignRequest {
            profile: "Default".to_string(),
            csr: "csr".to_string(),
            valid_not_before: Some(0),
            valid_not_after: None,
            subject: Some("CN=override".to_string()),
            crl_distribution_points: vec!["http://crl.example".to_string()],
            ..Default::default()
        };

        let decoded = proto::SignRequest::decode(request.encode_to_vec().as_slice()).unwrap();

        // Explicit presence distinguishes "unset" from the zero value
        assert_eq!(decoded.valid_not_before, Some(0));
        assert_eq!(decoded.valid_not_after, None);
        assert_eq!(decoded.subject.as_deref(), Some("CN=override"));
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_service_name() {
        assert_eq!(proto::crypto_broker_server::SERVICE_NAME, "cryptobroker.v1.CryptoBroker");
    }
}
