// ============================================================
// Layer 3 — Loss History
// ============================================================
// Ordered, append-only mapping from metric name to the values
// recorded for it. The key order is fixed when the history is
// created and is preserved in the JSON output:
//
//   {"generator_loss": [0.91, 0.85], "val_psnr": [21.4]}
//
// The history is write-only during a run. The loss log in the
// infra layer rewrites the whole file on every flush.

use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, Clone, Default)]
pub struct LossHistory {
    series: Vec<(String, Vec<f64>)>,
}

impl LossHistory {
    /// Create a history with the given metric keys, in output order.
    pub fn with_keys(keys: &[&str]) -> Self {
        Self {
            series: keys.iter().map(|k| (k.to_string(), Vec::new())).collect(),
        }
    }

    /// Append a value. Unknown metrics are added at the end.
    pub fn record(&mut self, metric: &str, value: f64) {
        match self.series.iter_mut().find(|(name, _)| name == metric) {
            Some((_, values)) => values.push(value),
            None => self.series.push((metric.to_string(), vec![value])),
        }
    }

    pub fn values(&self, metric: &str) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|(name, _)| name == metric)
            .map(|(_, v)| v.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|(_, v)| v.is_empty())
    }
}

impl Serialize for LossHistory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.series.len()))?;
        for (name, values) in &self.series {
            // JSON has no representation for infinity; a perfect PSNR is
            // written as null rather than failing the whole flush.
            let finite: Vec<Option<f64>> = values
                .iter()
                .map(|v| v.is_finite().then_some(*v))
                .collect();
            map.serialize_entry(name, &finite)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_order_preserved() {
        let mut h = LossHistory::with_keys(&["zeta", "alpha"]);
        h.record("alpha", 1.0);
        h.record("zeta", 2.0);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, r#"{"zeta":[2.0],"alpha":[1.0]}"#);
    }

    #[test]
    fn test_unknown_metric_appended() {
        let mut h = LossHistory::with_keys(&["a"]);
        h.record("b", 3.0);
        assert_eq!(h.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(h.values("b"), Some(&[3.0][..]));
    }

    #[test]
    fn test_infinite_values_serialise_as_null() {
        let mut h = LossHistory::with_keys(&["val_psnr"]);
        h.record("val_psnr", f64::INFINITY);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, r#"{"val_psnr":[null]}"#);
    }

    #[test]
    fn test_empty_history() {
        let h = LossHistory::with_keys(&["a", "b"]);
        assert!(h.is_empty());
    }
}
