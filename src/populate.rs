//! Synthetic row generation.
//!
//! Generators are pure: the same index always yields the same row, so a table
//! can be repopulated identically and the indexed and non-indexed variants
//! hold exactly the same data.

use crate::store::{Row, Value};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces the values for one row, in the order of [`RowGenerator::columns`].
pub trait RowGenerator {
    /// Insertable columns this generator fills.
    fn columns(&self) -> Vec<&'static str>;

    fn row(&self, index: u64) -> Row;
}

/// `value = index + 1`, i.e. the values `1..=N`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialValues;

impl RowGenerator for SequentialValues {
    fn columns(&self) -> Vec<&'static str> {
        vec!["value"]
    }

    fn row(&self, index: u64) -> Row {
        vec![Value::Int(index as i64 + 1)]
    }
}

/// Users with a uniformly random `user_id` in `1..=max_user_id`.
#[derive(Debug, Clone, Copy)]
pub struct RandomUsers {
    pub seed: u64,
    pub max_user_id: u64,
}

impl RandomUsers {
    pub fn new(seed: u64, max_user_id: u64) -> Self {
        Self {
            seed,
            max_user_id: max_user_id.max(1),
        }
    }
}

impl RowGenerator for RandomUsers {
    fn columns(&self) -> Vec<&'static str> {
        vec!["user_id", "name"]
    }

    fn row(&self, index: u64) -> Row {
        let mut rng = StdRng::seed_from_u64(self.seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let user_id = rng.gen_range(1..=self.max_user_id);
        vec![
            Value::Int(user_id as i64),
            Value::Text(format!("user_{:07}", index)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_values_start_at_one() {
        let gen = SequentialValues;
        assert_eq!(gen.row(0), vec![Value::Int(1)]);
        assert_eq!(gen.row(9_999), vec![Value::Int(10_000)]);
    }

    #[test]
    fn random_users_are_deterministic_and_in_range() {
        let gen = RandomUsers::new(42, 1_000);
        for i in 0..500 {
            let row = gen.row(i);
            assert_eq!(row, gen.row(i));
            match &row[0] {
                Value::Int(id) => assert!((1..=1_000).contains(id)),
                other => panic!("unexpected user_id {other:?}"),
            }
        }
        assert_eq!(gen.row(3)[1], Value::Text("user_0000003".to_string()));
    }
}
