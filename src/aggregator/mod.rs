//! Aggregator - Per-Product Summary Statistics
//!
//! ## Responsibilities
//!
//! - Group one camera's enriched detections by product id
//! - Accumulate count, score min/max/average, percentage averages
//! - Count detections per shelf status
//!
//! Pure transform over a single ingestion batch. Only observed product
//! ids produce summaries, so a zero-count group can never be emitted.

use crate::models::{EnrichedDetection, ProductSummary, ShelfStatus};
use std::collections::HashMap;

/// Running accumulator for one product group
struct ProductAccumulator {
    product_id: String,
    product_name: String,
    count: usize,
    sum_score: i64,
    min_score: i64,
    max_score: i64,
    sum_quantidade: f64,
    sum_qualidade: f64,
    sum_organizacao: f64,
    sum_contexto: f64,
    empties: usize,
    lows: usize,
    oks: usize,
    fulls: usize,
}

impl ProductAccumulator {
    fn new(detection: &EnrichedDetection) -> Self {
        Self {
            product_id: detection.product_id.clone(),
            product_name: detection.product_name.clone(),
            count: 0,
            sum_score: 0,
            min_score: i64::MAX,
            max_score: i64::MIN,
            sum_quantidade: 0.0,
            sum_qualidade: 0.0,
            sum_organizacao: 0.0,
            sum_contexto: 0.0,
            empties: 0,
            lows: 0,
            oks: 0,
            fulls: 0,
        }
    }

    fn add(&mut self, detection: &EnrichedDetection) {
        self.count += 1;
        self.sum_score += detection.score;
        self.min_score = self.min_score.min(detection.score);
        self.max_score = self.max_score.max(detection.score);
        self.sum_quantidade += detection.quantidade_pct;
        self.sum_qualidade += detection.qualidade_pct;
        self.sum_organizacao += detection.organizacao_pct;
        self.sum_contexto += detection.contexto_pct;
        match detection.status {
            ShelfStatus::Empty => self.empties += 1,
            ShelfStatus::Low => self.lows += 1,
            ShelfStatus::Ok => self.oks += 1,
            ShelfStatus::Full => self.fulls += 1,
        }
    }

    fn finish(self) -> ProductSummary {
        let count = self.count as f64;
        ProductSummary {
            product_id: self.product_id,
            product_name: self.product_name,
            count: self.count,
            avg_score: self.sum_score as f64 / count,
            min_score: self.min_score,
            max_score: self.max_score,
            avg_quantidade_pct: self.sum_quantidade / count,
            avg_qualidade_pct: self.sum_qualidade / count,
            avg_organizacao_pct: self.sum_organizacao / count,
            avg_contexto_pct: self.sum_contexto / count,
            empties: self.empties,
            lows: self.lows,
            oks: self.oks,
            fulls: self.fulls,
        }
    }
}

/// Summarize one camera's batch, one summary per distinct product id.
///
/// The empty string is a valid grouping key for detections lacking a
/// product id. Output preserves first-seen product order.
pub fn summarize(detections: &[EnrichedDetection]) -> Vec<ProductSummary> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, ProductAccumulator> = HashMap::new();

    for detection in detections {
        let acc = groups
            .entry(detection.product_id.clone())
            .or_insert_with(|| {
                order.push(detection.product_id.clone());
                ProductAccumulator::new(detection)
            });
        acc.add(detection);
    }

    order
        .into_iter()
        .filter_map(|product_id| groups.remove(&product_id))
        .map(ProductAccumulator::finish)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::enrich;
    use crate::models::RawDetection;

    fn detection(product_id: &str, score: i64) -> EnrichedDetection {
        let raw = RawDetection {
            roi_id: "r".to_string(),
            product_id: product_id.to_string(),
            product_name: format!("{} name", product_id),
            pontuacao_total: score,
            ..Default::default()
        };
        enrich("cam", &raw)
    }

    #[test]
    fn test_summary_statistics() {
        let detections = vec![
            detection("P1", 10),
            detection("P1", 50),
            detection("P1", 90),
        ];
        let summary = summarize(&detections);
        assert_eq!(summary.len(), 1);

        let p1 = &summary[0];
        assert_eq!(p1.product_id, "P1");
        assert_eq!(p1.count, 3);
        assert_eq!(p1.avg_score, 50.0);
        assert_eq!(p1.min_score, 10);
        assert_eq!(p1.max_score, 90);
        assert_eq!(p1.empties, 0);
        assert_eq!(p1.lows, 1);
        assert_eq!(p1.oks, 1);
        assert_eq!(p1.fulls, 1);
    }

    #[test]
    fn test_status_counts_sum_to_count() {
        let detections = vec![
            detection("P1", 0),
            detection("P1", 15),
            detection("P2", 30),
            detection("P2", 80),
            detection("P2", 100),
        ];
        for summary in summarize(&detections) {
            assert_eq!(
                summary.empties + summary.lows + summary.oks + summary.fulls,
                summary.count
            );
        }
    }

    #[test]
    fn test_avg_unrounded() {
        let detections = vec![detection("P1", 10), detection("P1", 15)];
        let summary = summarize(&detections);
        assert_eq!(summary[0].avg_score, 12.5);
    }

    #[test]
    fn test_empty_product_id_is_valid_group() {
        let detections = vec![detection("", 40), detection("", 60)];
        let summary = summarize(&detections);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].product_id, "");
        assert_eq!(summary[0].count, 2);
    }

    #[test]
    fn test_percentage_averages() {
        let mut a = detection("P1", 50);
        a.quantidade_pct = 80.0;
        a.qualidade_pct = 60.0;
        let mut b = detection("P1", 50);
        b.quantidade_pct = 40.0;
        b.qualidade_pct = 20.0;

        let summary = summarize(&[a, b]);
        assert_eq!(summary[0].avg_quantidade_pct, 60.0);
        assert_eq!(summary[0].avg_qualidade_pct, 40.0);
        assert_eq!(summary[0].avg_organizacao_pct, 0.0);
    }

    #[test]
    fn test_no_detections_no_summaries() {
        assert!(summarize(&[]).is_empty());
    }

    #[test]
    fn test_first_seen_order_preserved() {
        let detections = vec![
            detection("P2", 10),
            detection("P1", 20),
            detection("P2", 30),
        ];
        let summary = summarize(&detections);
        assert_eq!(summary[0].product_id, "P2");
        assert_eq!(summary[1].product_id, "P1");
    }
}
