//! Read JSON or YAML input documents. `.yaml` / `.yml` files go through
//! serde_yaml, everything else is parsed as JSON.

use crate::error::{Error, Result};

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let display = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|source| Error::Read {
        path: display.clone(),
        source,
    })?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    if is_yaml {
        serde_yaml::from_str(&text).map_err(|source| Error::ParseYaml {
            path: display,
            source,
        })
    } else {
        serde_json::from_str(&text).map_err(|source| Error::ParseJson {
            path: display,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Job;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn loads_yaml_and_json_alike() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("job.yaml");
        let mut f = fs::File::create(&yaml_path).unwrap();
        writeln!(f, "name: job-1\njob_type: tree_model\nserver_params:\n  spec: {{}}").unwrap();

        let json_path = dir.path().join("job.json");
        fs::write(
            &json_path,
            r#"{"name":"job-1","job_type":"tree_model","server_params":{"spec":{}}}"#,
        )
        .unwrap();

        let a: Job = load_document(&yaml_path).unwrap();
        let b: Job = load_document(&json_path).unwrap();
        assert_eq!(a.name, b.name);
        assert_eq!(a.server_params, json!({ "spec": {} }));
        assert_eq!(a.server_params, b.server_params);
        assert!(a.client_params.is_null());
    }

    #[test]
    fn reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let err = load_document::<Job>(&missing).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        let err = load_document::<Job>(&bad).unwrap_err();
        assert!(matches!(err, Error::ParseJson { .. }));
        assert!(err.to_string().contains("bad.json"));
    }
}
