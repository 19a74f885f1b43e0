//! Customer reviews.

use crate::error::CommerceError;
use crate::ids::{ItemId, ReviewId, UserId};
use serde::{Deserialize, Serialize};

/// Lowest accepted rating.
pub const MIN_RATING: i64 = 1;
/// Highest accepted rating.
pub const MAX_RATING: i64 = 5;

/// A published review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub item_id: ItemId,
    pub user_id: UserId,
    /// Display name chosen by the reviewer.
    pub name: String,
    pub rating: i64,
    pub comment: String,
    pub created_at: i64,
}

/// A review as submitted by a customer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    #[serde(default)]
    pub name: String,
    pub rating: Option<i64>,
    #[serde(default)]
    pub comment: String,
}

impl NewReview {
    /// Check required fields and the rating range, returning a trimmed copy.
    pub fn validate(&self) -> Result<(String, i64, String), CommerceError> {
        let name = self.name.trim();
        let comment = self.comment.trim();
        let rating = self
            .rating
            .ok_or_else(|| CommerceError::ValidationError("rating is required".into()))?;

        if name.is_empty() || comment.is_empty() {
            return Err(CommerceError::ValidationError(
                "name and comment are required".into(),
            ));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(CommerceError::ValidationError(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }
        Ok((name.to_string(), rating, comment.to_string()))
    }
}

/// Aggregate rating for an item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RatingSummary {
    pub count: usize,
    /// Mean rating rounded to one decimal, 0 when unrated.
    pub average: f64,
}

impl RatingSummary {
    pub fn from_ratings(ratings: impl IntoIterator<Item = i64>) -> Self {
        let (count, total) = ratings
            .into_iter()
            .fold((0usize, 0i64), |(n, sum), r| (n + 1, sum + r));
        if count == 0 {
            return Self::default();
        }
        let average = (total as f64 / count as f64 * 10.0).round() / 10.0;
        Self { count, average }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(name: &str, rating: Option<i64>, comment: &str) -> NewReview {
        NewReview {
            name: name.into(),
            rating,
            comment: comment.into(),
        }
    }

    #[test]
    fn test_validate_accepts_good_review() {
        let (name, rating, comment) = review(" An ", Some(5), " Lovely ").validate().unwrap();
        assert_eq!((name.as_str(), rating, comment.as_str()), ("An", 5, "Lovely"));
    }

    #[test]
    fn test_validate_rejects_bad_reviews() {
        assert!(review("", Some(4), "ok").validate().is_err());
        assert!(review("An", Some(4), "   ").validate().is_err());
        assert!(review("An", None, "ok").validate().is_err());
        assert!(review("An", Some(0), "ok").validate().is_err());
        assert!(review("An", Some(6), "ok").validate().is_err());
    }

    #[test]
    fn test_rating_summary() {
        assert_eq!(RatingSummary::from_ratings(vec![]), RatingSummary::default());
        let s = RatingSummary::from_ratings(vec![5, 4, 4]);
        assert_eq!(s.count, 3);
        assert!((s.average - 4.3).abs() < 1e-9);
    }
}
