//! Order identifiers and the payload strings derived from them

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Order identifier used when nothing else is configured
pub const DEFAULT_ORDER_ID: &str = "ORD-2025-001";
/// SKU used when nothing else is configured
pub const DEFAULT_SKU: &str = "TS-001";
/// URL template for the QR payload; `{order_id}` is substituted
pub const DEFAULT_URL_TEMPLATE: &str = "https://www.thednalabstore.com/order/{order_id}";
/// Separator between order id and SKU in the barcode payload
pub const PAYLOAD_DELIMITER: char = '|';

const ORDER_PLACEHOLDER: &str = "{order_id}";

/// An order line to be labelled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLabel {
    /// Order identifier, e.g. `ORD-2025-001`
    pub order_id: String,
    /// Stock keeping unit, e.g. `TS-001`
    pub sku: String,
}

impl OrderLabel {
    /// Build a label, rejecting blank identifiers.
    pub fn new(order_id: impl Into<String>, sku: impl Into<String>) -> Result<Self> {
        let order_id = order_id.into();
        let sku = sku.into();

        if order_id.trim().is_empty() {
            return Err(Error::InvalidOrder("order id must not be empty".to_string()));
        }
        if sku.trim().is_empty() {
            return Err(Error::InvalidOrder("SKU must not be empty".to_string()));
        }

        Ok(Self { order_id, sku })
    }

    /// Barcode payload: `<order-id>|<sku>`
    pub fn barcode_payload(&self) -> String {
        format!("{}{}{}", self.order_id, PAYLOAD_DELIMITER, self.sku)
    }

    /// QR payload built from a template containing `{order_id}`.
    pub fn url(&self, template: &str) -> Result<String> {
        if !template.contains(ORDER_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "URL template '{template}' does not contain {ORDER_PLACEHOLDER}"
            )));
        }
        Ok(template.replace(ORDER_PLACEHOLDER, &self.order_id))
    }

    /// Order id reduced to characters safe for a filename.
    pub fn file_stem(&self) -> String {
        self.order_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl Default for OrderLabel {
    fn default() -> Self {
        Self {
            order_id: DEFAULT_ORDER_ID.to_string(),
            sku: DEFAULT_SKU.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_barcode_payload() {
        let order = OrderLabel::default();
        assert_eq!(order.barcode_payload(), "ORD-2025-001|TS-001");
    }

    #[test]
    fn test_default_url() {
        let order = OrderLabel::default();
        assert_eq!(
            order.url(DEFAULT_URL_TEMPLATE).unwrap(),
            "https://www.thednalabstore.com/order/ORD-2025-001"
        );
    }

    #[test]
    fn test_template_without_placeholder() {
        let order = OrderLabel::default();
        assert!(matches!(
            order.url("https://example.com/order"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_blank_fields_rejected() {
        assert!(matches!(
            OrderLabel::new("  ", "TS-001"),
            Err(Error::InvalidOrder(_))
        ));
        assert!(matches!(
            OrderLabel::new("ORD-1", ""),
            Err(Error::InvalidOrder(_))
        ));
    }

    #[test]
    fn test_file_stem_sanitized() {
        let order = OrderLabel::new("ORD/2025 001", "X").unwrap();
        assert_eq!(order.file_stem(), "ORD_2025_001");
    }
}
