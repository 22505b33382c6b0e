use anyhow::Result;

use crate::embedder::Embedder;
use crate::vector::{cosine_similarity, euclidean_distance};

/// Classic word-vector arithmetic sanity check: king − man + woman should
/// land near queen. Runs entirely offline against the local model.
pub fn run(embedder: &mut Embedder) -> Result<()> {
    let king = embedder.embed("king")?;
    let man = embedder.embed("man")?;
    let woman = embedder.embed("woman")?;
    let queen = embedder.embed("queen")?;

    let cases = [
        (
            "King - Man + Woman = Queen",
            combine(&king, &man, &woman),
            &queen,
        ),
        (
            "Queen + Man - Woman = King",
            combine(&queen, &woman, &man),
            &king,
        ),
        ("King - Man + Man = King", combine(&king, &man, &man), &king),
    ];

    println!("\nCosine similarity:");
    for (label, lhs, rhs) in &cases {
        println!("{label}: {:.4}", cosine_similarity(lhs, rhs));
    }

    println!("\nEuclidean distance:");
    for (label, lhs, rhs) in &cases {
        println!("{label}: {:.4}", euclidean_distance(lhs, rhs));
    }

    Ok(())
}

/// Element-wise `a - b + c`.
fn combine(a: &[f32], b: &[f32], c: &[f32]) -> Vec<f32> {
    a.iter()
        .zip(b.iter())
        .zip(c.iter())
        .map(|((x, y), z)| x - y + z)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine() {
        let a = vec![1.0, 2.0];
        let b = vec![0.5, 1.0];
        let c = vec![0.25, 0.25];
        assert_eq!(combine(&a, &b, &c), vec![0.75, 1.25]);
    }
}
