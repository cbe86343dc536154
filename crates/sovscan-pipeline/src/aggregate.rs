//! Per-brand totals and share-of-voice across all analyzed pages.

use std::cmp::Ordering;
use std::collections::HashMap;

use sovscan_core::{BrandTotal, PageAnalysis};

/// The aggregate portion of an `AnalysisReport`.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    /// Ranked: SOV descending, then mentions descending, then name ascending.
    pub brand_totals: Vec<BrandTotal>,
    pub total_mentions: u64,
    /// 1-based position of the target in `brand_totals`, if mentioned at all.
    pub target_brand_rank: Option<usize>,
}

impl Aggregate {
    #[must_use]
    pub fn target_total(&self) -> Option<&BrandTotal> {
        self.brand_totals.iter().find(|b| b.is_target_brand)
    }
}

/// Sum mentions per brand over every successfully analyzed page.
///
/// Brand names are merged case-insensitively; the first spelling seen is
/// kept. `sov_percent` is rounded to two decimals and is 0 for every brand
/// when nothing was mentioned.
#[must_use]
pub fn aggregate(pages: &[PageAnalysis], target_brand: &str) -> Aggregate {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut totals: Vec<(String, u64)> = Vec::new();
    let mut grand_total = 0u64;

    for page in pages.iter().filter(|p| p.analysis_succeeded) {
        for mention in &page.mentions {
            if mention.mention_count == 0 {
                continue;
            }
            let count = u64::from(mention.mention_count);
            let key = mention.brand_name.trim().to_lowercase();
            let slot = *index.entry(key).or_insert_with(|| {
                totals.push((mention.brand_name.trim().to_string(), 0));
                totals.len() - 1
            });
            totals[slot].1 += count;
            grand_total += count;
        }
    }

    let target = target_brand.trim().to_lowercase();
    let mut brand_totals: Vec<BrandTotal> = totals
        .into_iter()
        .map(|(brand_name, total_mentions)| BrandTotal {
            is_target_brand: brand_name.to_lowercase() == target,
            sov_percent: share_percent(total_mentions, grand_total),
            brand_name,
            total_mentions,
        })
        .collect();

    brand_totals.sort_by(rank_order);

    let target_brand_rank = brand_totals
        .iter()
        .position(|b| b.is_target_brand)
        .map(|i| i + 1);

    Aggregate {
        brand_totals,
        total_mentions: grand_total,
        target_brand_rank,
    }
}

fn rank_order(a: &BrandTotal, b: &BrandTotal) -> Ordering {
    b.sov_percent
        .total_cmp(&a.sov_percent)
        .then_with(|| b.total_mentions.cmp(&a.total_mentions))
        .then_with(|| a.brand_name.cmp(&b.brand_name))
}

#[allow(clippy::cast_precision_loss)]
fn share_percent(count: u64, grand_total: u64) -> f64 {
    if grand_total == 0 {
        return 0.0;
    }
    round2(count as f64 / grand_total as f64 * 100.0)
}

/// Round half away from zero to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
