use serde::Serialize;
use serde_json::{Map, Value};

/// Keys owned by the Grafana server, never reported as changes
const SERVER_OWNED: &[&str] = &["id", "orgId"];

/// Field-level difference between a remote record and the desired payload
#[derive(Serialize, Debug, Clone)]
pub struct Diff {
    pub old: Map<String, Value>,
    pub new: Map<String, Value>,
}

impl Diff {
    /// Compute the difference between `old` (remote) and `new` (desired).
    ///
    /// Keys of `old` that are server-owned or missing from `new` are dropped.
    /// Keys equal on both sides are dropped from both. Keys only present in
    /// `new` are always kept.
    pub fn between(old: &Map<String, Value>, new: &Map<String, Value>) -> Self {
        let mut diff = Self {
            old: Map::new(),
            new: new.clone(),
        };

        for (key, value) in old {
            if SERVER_OWNED.contains(&key.as_str()) {
                continue;
            }

            match new.get(key) {
                None => {}
                Some(desired) if desired == value => {
                    diff.new.remove(key);
                }
                Some(_) => {
                    diff.old.insert(key.clone(), value.clone());
                }
            }
        }

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.old.is_empty() && self.new.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn ignores_server_owned_keys() {
        let old = map(json!({"id": 1, "orgId": 1, "name": "influxdb"}));
        let new = map(json!({"id": 2, "name": "influxdb"}));

        let diff = Diff::between(&old, &new);

        assert!(diff.old.is_empty());
        assert_eq!(diff.new, map(json!({"id": 2})));
    }

    #[test]
    fn drops_equal_keys_from_both_sides() {
        let old = map(json!({"name": "influxdb", "url": "http://a:8086", "isDefault": false}));
        let new = map(json!({"name": "influxdb", "url": "http://b:8086", "isDefault": false}));

        let diff = Diff::between(&old, &new);

        assert_eq!(diff.old, map(json!({"url": "http://a:8086"})));
        assert_eq!(diff.new, map(json!({"url": "http://b:8086"})));
    }

    #[test]
    fn drops_remote_only_keys_and_keeps_desired_only_keys() {
        let old = map(json!({"name": "influxdb", "readOnly": false}));
        let new = map(json!({"name": "influxdb", "jsonData": null}));

        let diff = Diff::between(&old, &new);

        assert!(diff.old.is_empty());
        assert_eq!(diff.new, map(json!({"jsonData": null})));
        assert!(!diff.is_empty());
    }

    #[test]
    fn empty_and_falsy_values_still_differ() {
        let old = map(json!({"user": "admin", "basicAuth": true}));
        let new = map(json!({"user": "", "basicAuth": false}));

        let diff = Diff::between(&old, &new);

        assert_eq!(diff.old, old);
        assert_eq!(diff.new, new);
    }

    #[test]
    fn identical_records_are_empty() {
        let old = map(json!({"id": 3, "orgId": 1, "name": "loki", "type": "loki"}));
        let new = map(json!({"name": "loki", "type": "loki"}));

        assert!(Diff::between(&old, &new).is_empty());
    }
}
