//! Rendering of generation results for the terminal and for JSON consumers

use crate::artifact::Artifact;
use crate::generator::LabelSet;
use hex::encode as hex_encode;
use serde_json::{Map, Value, json};

/// Combined structured and human-readable representation of a run
#[derive(Debug, Clone)]
pub struct RenderedReport {
    /// Structured JSON representation suitable for downstream consumers
    pub json: Value,
    /// Human-readable lines for terminal presentation
    pub human: Vec<String>,
}

/// Outcome of reading one artifact back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Not checked
    Skipped,
    /// Decoded payload matched
    Verified(String),
}

/// Render a label set, with one verification entry per artifact in
/// generation order (missing entries count as skipped).
pub fn render_label_set(set: &LabelSet, verifications: &[Verification]) -> RenderedReport {
    let mut human = Vec::new();
    human.push(format!("Order {} (SKU {})", set.order.order_id, set.order.sku));

    let mut artifacts = Vec::new();
    for (index, artifact) in set.artifacts().enumerate() {
        let verification = verifications.get(index).unwrap_or(&Verification::Skipped);
        human.extend(human_lines_for_artifact(artifact, verification));
        artifacts.push(artifact_value(artifact, verification));
    }

    let mut root = Map::new();
    root.insert(
        "order".to_string(),
        json!({
            "order_id": set.order.order_id,
            "sku": set.order.sku,
        }),
    );
    root.insert("artifacts".to_string(), Value::Array(artifacts));

    RenderedReport {
        json: Value::Object(root),
        human,
    }
}

/// Produce a structured JSON representation of a single artifact.
pub fn artifact_value(artifact: &Artifact, verification: &Verification) -> Value {
    let verified = match verification {
        Verification::Skipped => Value::Null,
        Verification::Verified(_) => Value::Bool(true),
    };

    json!({
        "kind": artifact.kind,
        "path": artifact.path.display().to_string(),
        "payload": artifact.payload,
        "payload_hex": hex_encode(artifact.payload.as_bytes()),
        "width": artifact.width,
        "height": artifact.height,
        "byte_length": artifact.byte_length,
        "verified": verified,
    })
}

fn human_lines_for_artifact(artifact: &Artifact, verification: &Verification) -> Vec<String> {
    let mut lines = vec![
        format!("  {}: {}", artifact.kind, artifact.path.display()),
        format!("    Payload: {}", artifact.payload),
        format!(
            "    Image: {}x{} px, {} bytes",
            artifact.width, artifact.height, artifact.byte_length
        ),
    ];
    if let Verification::Verified(decoded) = verification {
        lines.push(format!("    Verified: decodes to {decoded}"));
    }
    lines
}
