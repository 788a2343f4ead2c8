use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Long-running operation returned by every mutating platform call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Operation {
    pub name: String,

    #[serde(default)]
    pub done: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

/// Terminal error of an operation (google.rpc.Status shape).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationStatus {
    #[serde(default)]
    pub code: i32,

    #[serde(default)]
    pub message: String,
}

impl Operation {
    /// `true` once the operation has finished, successfully or not.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Response payload without the `@type` discriminator the platform adds.
    pub fn response_body(&self) -> Option<Value> {
        let mut resp = self.response.clone()?;
        if let Some(obj) = resp.as_object_mut() {
            obj.remove("@type");
        }
        Some(resp)
    }
}
