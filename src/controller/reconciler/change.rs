//! # Change Detection
//!
//! Decides whether the AWS secret needs a write.
//!
//! Only key-set membership is compared, with import-only keys left out on
//! both sides. A value-only change on an existing key does not trigger a write.

use crate::controller::reconciler::codec::SecretValues;
use crate::controller::reconciler::merge::VaultSecretState;
use crate::crd::ASecretSpec;

/// True when the AWS secret is missing or its key set differs from the target
#[must_use]
pub fn needs_vault_update(
    spec: &ASecretSpec,
    target: &SecretValues,
    vault: &VaultSecretState,
) -> bool {
    if !vault.exists {
        return true;
    }

    let comparable = |key: &&String| !spec.is_import_only_key(key);

    let missing_remotely = target
        .keys()
        .filter(comparable)
        .any(|key| !vault.values.contains_key(key));
    let extra_remotely = vault
        .values
        .keys()
        .filter(comparable)
        .any(|key| !target.contains_key(key));

    missing_remotely || extra_remotely
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::reconciler::codec::ValueType;
    use crate::crd::DataSource;
    use std::collections::BTreeMap;

    fn spec(import_only_keys: &[&str]) -> ASecretSpec {
        ASecretSpec {
            target_secret_name: "app".to_string(),
            aws_secret_path: "/app".to_string(),
            kms_key_id: None,
            data: import_only_keys
                .iter()
                .map(|k| {
                    (
                        (*k).to_string(),
                        DataSource {
                            only_import_remote: Some(true),
                            ..DataSource::default()
                        },
                    )
                })
                .collect(),
            tags: BTreeMap::new(),
            only_import_remote: None,
            value_type: ValueType::Kv,
            refresh_interval: None,
            target_secret_template: None,
        }
    }

    fn values(pairs: &[(&str, &str)]) -> SecretValues {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn test_missing_vault_always_needs_update() {
        assert!(needs_vault_update(
            &spec(&[]),
            &SecretValues::new(),
            &VaultSecretState::missing()
        ));
    }

    #[test]
    fn test_same_key_set_needs_no_update() {
        let vault = VaultSecretState::found(values(&[("a", "1"), ("b", "2")]));
        assert!(!needs_vault_update(
            &spec(&[]),
            &values(&[("a", "1"), ("b", "2")]),
            &vault
        ));
    }

    #[test]
    fn test_value_only_change_needs_no_update() {
        let vault = VaultSecretState::found(values(&[("a", "old")]));
        assert!(!needs_vault_update(&spec(&[]), &values(&[("a", "new")]), &vault));
    }

    #[test]
    fn test_key_missing_remotely_needs_update() {
        let vault = VaultSecretState::found(values(&[("a", "1")]));
        assert!(needs_vault_update(
            &spec(&[]),
            &values(&[("a", "1"), ("b", "2")]),
            &vault
        ));
    }

    #[test]
    fn test_extra_remote_key_needs_update() {
        let vault = VaultSecretState::found(values(&[("a", "1"), ("stale", "x")]));
        assert!(needs_vault_update(&spec(&[]), &values(&[("a", "1")]), &vault));
    }

    #[test]
    fn test_import_only_key_present_remotely_needs_no_update() {
        let vault = VaultSecretState::found(values(&[("a", "1"), ("imported", "x")]));
        assert!(!needs_vault_update(
            &spec(&["imported"]),
            &values(&[("a", "1"), ("imported", "x")]),
            &vault
        ));
    }

    #[test]
    fn test_import_only_key_alone_never_triggers_update() {
        let vault = VaultSecretState::found(values(&[("a", "1")]));
        // present locally but absent remotely
        assert!(!needs_vault_update(
            &spec(&["imported"]),
            &values(&[("a", "1"), ("imported", "x")]),
            &vault
        ));
    }
}
