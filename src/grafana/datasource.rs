use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A data source as returned by `GET /api/datasources`
#[derive(Deserialize, Debug, Clone)]
pub struct Datasource {
    pub id: u64,
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Datasource {
    /// The full record as a JSON object, server-owned keys included
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.fields.clone();
        map.insert("id".to_string(), Value::from(self.id));
        map.insert("name".to_string(), Value::from(self.name.clone()));
        map
    }
}

/// Desired state of a data source, serialized as the POST/PUT body
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub access: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub basic_auth: bool,
    pub basic_auth_user: String,
    pub basic_auth_password: String,
    pub is_default: bool,
    pub json_data: Option<Value>,
}

impl DatasourceSpec {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            url: url.into(),
            access: "proxy".to_string(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
            basic_auth: false,
            basic_auth_user: String::new(),
            basic_auth_password: String::new(),
            is_default: false,
            json_data: None,
        }
    }

    /// The request body as a JSON object
    pub fn to_map(&self) -> serde_json::Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "data source body is not an object: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_uses_grafana_field_names() {
        let mut spec = DatasourceSpec::new("influxdb", "influxdb", "http://localhost:8086");
        spec.is_default = true;

        assert_eq!(
            Value::Object(spec.to_map().unwrap()),
            json!({
                "name": "influxdb",
                "type": "influxdb",
                "url": "http://localhost:8086",
                "access": "proxy",
                "user": "",
                "password": "",
                "database": "",
                "basicAuth": false,
                "basicAuthUser": "",
                "basicAuthPassword": "",
                "isDefault": true,
                "jsonData": null,
            })
        );
    }

    #[test]
    fn remote_record_keeps_unknown_keys() {
        let datasource: Datasource = serde_json::from_value(json!({
            "id": 7,
            "orgId": 1,
            "uid": "abc",
            "name": "prometheus",
            "type": "prometheus",
            "readOnly": false,
        }))
        .unwrap();

        assert_eq!(datasource.id, 7);
        assert_eq!(datasource.name, "prometheus");

        let map = datasource.to_map();
        assert_eq!(map["orgId"], json!(1));
        assert_eq!(map["uid"], json!("abc"));
        assert_eq!(map["id"], json!(7));
        assert_eq!(map["name"], json!("prometheus"));
    }
}
