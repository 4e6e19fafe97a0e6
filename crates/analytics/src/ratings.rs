//! Provider rating leaderboard built from reviews.

use facility_core::types::{Provider, Review};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::math::mean;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRating {
    pub provider_id: String,
    pub name: String,
    pub is_active: bool,
    /// Mean review rating, or the stored `average_rating` without reviews.
    pub rating: Option<f64>,
    pub review_count: u64,
    /// Reviews per star, index 0 = 1 star.
    pub distribution: [u64; 5],
}

pub fn provider_ratings(providers: &[Provider], reviews: &[Review]) -> Vec<ProviderRating> {
    let mut by_provider: HashMap<&str, Vec<f64>> = HashMap::new();
    for review in reviews {
        let (Some(provider), Some(rating)) = (
            review.provider_id.as_deref(),
            review.rating.filter(|r| r.is_finite()),
        ) else {
            continue;
        };
        by_provider
            .entry(provider)
            .or_default()
            .push(rating.clamp(1.0, 5.0));
    }

    let mut rows: Vec<ProviderRating> = providers
        .iter()
        .filter(|provider| !provider.id.is_empty())
        .map(|provider| {
            let ratings = by_provider
                .get(provider.id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let mut distribution = [0u64; 5];
            for rating in ratings {
                distribution[(rating.round() as usize).clamp(1, 5) - 1] += 1;
            }
            ProviderRating {
                provider_id: provider.id.clone(),
                name: provider.full_name.clone(),
                is_active: provider.is_active,
                rating: if ratings.is_empty() {
                    provider.average_rating.filter(|r| r.is_finite())
                } else {
                    Some(mean(ratings))
                },
                review_count: ratings.len() as u64,
                distribution,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        let a_rating = a.rating.unwrap_or(f64::NEG_INFINITY);
        let b_rating = b.rating.unwrap_or(f64::NEG_INFINITY);
        b_rating
            .total_cmp(&a_rating)
            .then_with(|| b.review_count.cmp(&a.review_count))
            .then_with(|| a.provider_id.cmp(&b.provider_id))
    });
    rows
}
