use serde::{Deserialize, Serialize};

use crate::error::{PostMortemError, PostMortemResult};
use crate::render::ChartFrame;

use super::SelectionEvent;

pub const CHART_FRAME_JSON_SCHEMA_V1: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartFrameJsonContractV1 {
    pub schema_version: u32,
    pub frame: ChartFrame,
}

impl ChartFrame {
    pub fn to_json_contract_v1_pretty(&self) -> PostMortemResult<String> {
        let payload = ChartFrameJsonContractV1 {
            schema_version: CHART_FRAME_JSON_SCHEMA_V1,
            frame: self.clone(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            PostMortemError::InvalidData(format!("failed to serialize chart frame contract v1: {e}"))
        })
    }

    /// Accepts either a bare frame or a versioned contract.
    pub fn from_json_compat_str(input: &str) -> PostMortemResult<Self> {
        if let Ok(frame) = serde_json::from_str::<ChartFrame>(input) {
            return Ok(frame);
        }
        let payload: ChartFrameJsonContractV1 = serde_json::from_str(input).map_err(|e| {
            PostMortemError::InvalidData(format!("failed to parse chart frame json payload: {e}"))
        })?;
        if payload.schema_version != CHART_FRAME_JSON_SCHEMA_V1 {
            return Err(PostMortemError::InvalidData(format!(
                "unsupported chart frame schema version: {}",
                payload.schema_version
            )));
        }
        Ok(payload.frame)
    }
}

impl SelectionEvent {
    /// Parses an event posted by the chart host.
    pub fn from_json_str(input: &str) -> PostMortemResult<Self> {
        serde_json::from_str(input).map_err(|e| {
            PostMortemError::InvalidData(format!("failed to parse selection event: {e}"))
        })
    }

    pub fn to_json(&self) -> PostMortemResult<String> {
        serde_json::to_string(self).map_err(|e| {
            PostMortemError::InvalidData(format!("failed to serialize selection event: {e}"))
        })
    }
}
