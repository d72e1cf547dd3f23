//! OData envelope types shared by every Graph call.

use serde::Deserialize;

/// One page of a Graph collection response.
#[derive(Debug, Deserialize)]
pub struct ODataPage<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
    #[serde(rename = "@odata.count")]
    pub count: Option<i64>,
}

/// OData error response from Microsoft Graph.
#[derive(Debug, Deserialize)]
pub struct ODataError {
    pub error: ODataErrorBody,
}

/// OData error body.
#[derive(Debug, Deserialize)]
pub struct ODataErrorBody {
    pub code: String,
    pub message: String,
    #[serde(rename = "innerError")]
    pub inner_error: Option<serde_json::Value>,
}

/// Error body returned by the token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_with_next_link() {
        let page: ODataPage<serde_json::Value> = serde_json::from_value(json!({
            "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#users",
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/users?$skiptoken=abc",
            "value": [{"id": "1"}, {"id": "2"}]
        }))
        .unwrap();

        assert_eq!(page.value.len(), 2);
        assert!(page.next_link.unwrap().contains("skiptoken"));
    }

    #[test]
    fn test_page_without_value() {
        let page: ODataPage<serde_json::Value> = serde_json::from_value(json!({})).unwrap();
        assert!(page.value.is_empty());
        assert!(page.next_link.is_none());
    }

    #[test]
    fn test_odata_error() {
        let err: ODataError = serde_json::from_value(json!({
            "error": {
                "code": "Request_ResourceNotFound",
                "message": "Resource 'abc' does not exist",
                "innerError": {"request-id": "r1"}
            }
        }))
        .unwrap();

        assert_eq!(err.error.code, "Request_ResourceNotFound");
        assert!(err.error.inner_error.is_some());
    }
}
