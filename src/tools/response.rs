use serde_json::Value;

/// Result payload of a tool, optionally carrying Slack paging state
#[derive(Debug)]
pub struct ToolResponse {
    pub data: Value,
    pub page: Option<PageInfo>,
}

#[derive(Debug)]
pub struct PageInfo {
    pub has_more: bool,
    /// Cursor to pass back to fetch the next page
    pub next_cursor: Option<String>,
}

impl ToolResponse {
    pub fn data(data: Value) -> Self {
        Self { data, page: None }
    }

    pub fn paginated(data: Value, has_more: bool, next_cursor: Option<String>) -> Self {
        Self {
            data,
            page: Some(PageInfo {
                has_more,
                next_cursor,
            }),
        }
    }

    /// Flatten paging fields into the data object
    pub fn into_json(self) -> Value {
        let Some(page) = self.page else {
            return self.data;
        };

        let mut result = self.data;
        if let Value::Object(map) = &mut result {
            map.insert("has_more".to_string(), page.has_more.into());
            if let Some(cursor) = page.next_cursor {
                map.insert("next_cursor".to_string(), cursor.into());
            }
        }
        result
    }
}
