use crate::instance::{PluginInstance, PluginType};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InstanceValidationError {
    message: String,
}

impl InstanceValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn validate_instance(instance: &PluginInstance) -> Result<(), InstanceValidationError> {
    if instance.id <= 0 {
        return Err(InstanceValidationError::new(format!(
            "instance id {} must be positive",
            instance.id
        )));
    }

    if instance.previous_id == Some(instance.id) {
        return Err(InstanceValidationError::new(format!(
            "instance {} cannot be its own previous instance",
            instance.id
        )));
    }

    if instance.plugin_name.trim().is_empty() {
        return Err(InstanceValidationError::new(format!(
            "instance {} requires a plugin name",
            instance.id
        )));
    }

    match (instance.plugin_type, instance.previous_id) {
        (PluginType::Fs, Some(previous)) => {
            return Err(InstanceValidationError::new(format!(
                "instance {} is an fs plugin and cannot run on instance {}",
                instance.id, previous
            )));
        }
        (PluginType::Ds | PluginType::Ts, None) => {
            return Err(InstanceValidationError::new(format!(
                "instance {} is a {} plugin and requires a previous instance",
                instance.id, instance.plugin_type
            )));
        }
        _ => {}
    }

    if let (Some(start), Some(end)) = (instance.start_date, instance.end_date) {
        if end < start {
            return Err(InstanceValidationError::new(format!(
                "instance {} ends ({}) before it starts ({})",
                instance.id, end, start
            )));
        }
    }

    Ok(())
}

/// Orphans and cycles are allowed here; the tree builder reports them.
pub fn validate_instance_collection(
    instances: &[PluginInstance],
) -> Result<(), InstanceValidationError> {
    let mut seen_ids = HashSet::with_capacity(instances.len());
    for instance in instances {
        if !seen_ids.insert(instance.id) {
            return Err(InstanceValidationError::new(format!(
                "duplicate instance id {}",
                instance.id
            )));
        }
        validate_instance(instance)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn accepts_root_and_child() {
        let instances = vec![
            PluginInstance::root(1, "pl-dircopy"),
            PluginInstance::child_of(2, 1, "pl-fshack"),
        ];
        assert!(validate_instance_collection(&instances).is_ok());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let instances = vec![
            PluginInstance::root(1, "pl-dircopy"),
            PluginInstance::child_of(1, 1, "pl-fshack"),
        ];
        let err = validate_instance_collection(&instances).unwrap_err();
        assert_eq!(err.to_string(), "duplicate instance id 1");
    }

    #[test]
    fn rejects_self_reference_and_blank_plugin() {
        let err = validate_instance(&PluginInstance::child_of(4, 4, "pl-x")).unwrap_err();
        assert!(err.to_string().contains("its own previous"));

        let err = validate_instance(&PluginInstance::root(5, "  ")).unwrap_err();
        assert!(err.to_string().contains("plugin name"));
    }

    #[test]
    fn plugin_type_must_agree_with_previous_id() {
        let mut fs = PluginInstance::child_of(2, 1, "pl-dircopy");
        fs.plugin_type = PluginType::Fs;
        assert!(validate_instance(&fs).is_err());

        let ds = PluginInstance::new(3, "pl-fshack");
        assert!(validate_instance(&ds).is_err());
    }

    #[test]
    fn rejects_end_before_start() {
        let mut instance = PluginInstance::root(1, "pl-dircopy");
        let now = Utc::now();
        instance.start_date = Some(now);
        instance.end_date = Some(now - Duration::minutes(5));
        assert!(validate_instance(&instance).is_err());
    }
}
