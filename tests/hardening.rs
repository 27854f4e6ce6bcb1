//! Input validation and security hardening tests.
//!
//! Construction-time rejection paths, rollback guarantees, and the
//! negative-containment property: nothing the component publishes may
//! carry private key material.

mod support;
use support::*;

use std::sync::Arc;

use gatepost::error::{ConfigError, Error, KeypairError};
use gatepost::{Algorithm, Auth, AuthArgs, Engine, Linkable, Secret, Transform, WorkerSpec};

// ============================================================================
// Configuration errors fire before any resource exists
// ============================================================================

#[test]
fn test_reserved_private_key_collision() {
    let t = Test::new();
    let spec = handler_spec().with_env("AUTH_PRIVATE_KEY", "spoofed");

    let err = Auth::new(&t.engine, "api-auth", AuthArgs::new(spec)).unwrap_err();

    assert_eq!(
        err,
        Error::Config(ConfigError::ReservedKey("AUTH_PRIVATE_KEY".to_string()))
    );
    // No graph entry, no keypair, no deployment.
    assert!(!t.engine.has_component("api-auth"));
    assert_eq!(t.deployer.deploy_count(), 0);
}

#[test]
fn test_reserved_public_key_collision() {
    let t = Test::new();
    let spec = handler_spec().with_env("AUTH_PUBLIC_KEY", "spoofed");

    let err = Auth::new(&t.engine, "api-auth", AuthArgs::new(spec)).unwrap_err();

    assert_eq!(
        err,
        Error::Config(ConfigError::ReservedKey("AUTH_PUBLIC_KEY".to_string()))
    );
    assert!(!t.engine.has_component("api-auth"));
}

#[test]
fn test_empty_name_rejected() {
    let t = Test::new();
    let err = Auth::new(&t.engine, "", AuthArgs::new(handler_spec())).unwrap_err();

    assert_eq!(err, Error::Config(ConfigError::EmptyName));
    assert_eq!(t.deployer.deploy_count(), 0);
}

#[test]
fn test_invalid_name_rejected() {
    let t = Test::new();

    for name in ["Has-Upper", "spaced name", "under_score", "-dash-first"] {
        let err = Auth::new(&t.engine, name, AuthArgs::new(handler_spec())).unwrap_err();
        assert!(
            matches!(err, Error::Config(ConfigError::InvalidName { .. })),
            "name {:?} should be rejected",
            name
        );
    }
}

#[test]
fn test_duplicate_name_rejected() {
    let t = Test::new();
    let _first = t.auth("api-auth");

    let err = Auth::new(&t.engine, "api-auth", AuthArgs::new(handler_spec())).unwrap_err();

    assert_eq!(
        err,
        Error::Config(ConfigError::DuplicateName("api-auth".to_string()))
    );
    // The live instance is untouched.
    assert!(t.engine.has_component("api-auth"));
    assert_eq!(t.engine.resources("api-auth").unwrap().len(), 2);
}

#[test]
fn test_invalid_env_key_rejected() {
    let t = Test::new();
    let spec = WorkerSpec::new(CODE_REF).with_env("NOT-A-VAR", "x");

    let err = Auth::new(&t.engine, "api-auth", AuthArgs::new(spec)).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::InvalidEnvKey { .. })
    ));
}

// ============================================================================
// Collaborator failures roll construction back
// ============================================================================

#[test]
fn test_unsupported_algorithm_propagates() {
    let t = Test::new();
    let args = AuthArgs {
        authenticator: handler_spec(),
        transform: None,
        algorithm: Some(Algorithm::Rsa4096),
    };

    let err = Auth::new(&t.engine, "api-auth", args).unwrap_err();

    assert_eq!(
        err,
        Error::Keypair(KeypairError::UnsupportedAlgorithm("rsa-4096".to_string()))
    );
    assert!(!t.engine.has_component("api-auth"));
    assert_eq!(t.deployer.deploy_count(), 0);
}

#[test]
fn test_generation_failure_propagates_unchanged() {
    let deployer = Arc::new(gatepost::LocalDeployer::new());
    let engine = Engine::new(
        Arc::new(FailingProvider),
        Arc::clone(&deployer) as Arc<dyn gatepost::Deployer>,
    );

    let err = Auth::new(&engine, "api-auth", AuthArgs::new(handler_spec())).unwrap_err();

    assert_eq!(
        err,
        Error::Keypair(KeypairError::Generation(
            "entropy source unavailable".to_string()
        ))
    );
    assert!(!engine.has_component("api-auth"));
    assert_eq!(deployer.deploy_count(), 0);
}

#[test]
fn test_transform_smuggling_reserved_key_rolls_back() {
    let t = Test::new();
    let args = AuthArgs {
        authenticator: handler_spec(),
        transform: Some(Transform {
            worker: Some(Box::new(|spec| {
                spec.with_env("AUTH_PRIVATE_KEY", Secret::from("smuggled"))
            })),
        }),
        algorithm: None,
    };

    let err = Auth::new(&t.engine, "api-auth", args).unwrap_err();

    assert!(matches!(err, Error::Config(ConfigError::ReservedKey(_))));
    assert!(!t.engine.has_component("api-auth"));
    assert_eq!(t.deployer.deploy_count(), 0);

    // The rolled-back name is free again.
    let auth = t.auth("api-auth");
    assert!(auth.authenticator().wait().is_ok());
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use gatepost::Component;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(25))]

        /// Nothing the component publishes contains the private key PEM:
        /// not the link payload, not its serialized form, not the engine
        /// state snapshot, not the component's debug output.
        #[test]
        fn link_payload_never_contains_private_key(
            issuer in "[a-z0-9.-]{1,40}",
            extra_key in "[A-Z][A-Z0-9_]{0,20}",
            extra_value in "[ -~]{0,60}",
        ) {
            prop_assume!(extra_key != "AUTH_PRIVATE_KEY" && extra_key != "AUTH_PUBLIC_KEY");

            let t = Test::new();
            let spec = WorkerSpec::new(CODE_REF)
                .with_env("ISSUER", issuer.as_str())
                .with_env(extra_key.as_str(), extra_value.as_str());
            let auth = Auth::new(&t.engine, "api-auth", AuthArgs::new(spec)).unwrap();

            let private = auth.key().private_key_pem().expose_secret().clone();
            // The PEM body, without header/footer framing lines.
            let private_body: Vec<&str> = private
                .lines()
                .filter(|l| !l.starts_with("-----"))
                .collect();

            let payload_json = serde_json::to_string(&auth.to_link_payload()).unwrap();
            let state_json = t.engine.export_state().to_string();
            let debug_out = format!("{:?}", auth);

            for published in [payload_json.as_str(), state_json.as_str(), debug_out.as_str()] {
                prop_assert!(!published.contains(&private));
                for line in &private_body {
                    prop_assert!(!published.contains(line));
                }
            }
        }

        /// Valid specs construct successfully with both PEM halves present
        /// and an empty permission declaration.
        #[test]
        fn valid_specs_construct(issuer in "[a-z0-9.-]{1,40}") {
            let t = Test::new();
            let spec = WorkerSpec::new(CODE_REF).with_env("ISSUER", issuer.as_str());
            let auth = Auth::new(&t.engine, "api-auth", AuthArgs::new(spec)).unwrap();

            prop_assert!(!auth.key().private_key_pem().expose_secret().is_empty());
            prop_assert!(!auth.key().public_key_pem().expose_secret().is_empty());
            prop_assert!(auth.required_permissions().is_empty());
        }
    }
}
