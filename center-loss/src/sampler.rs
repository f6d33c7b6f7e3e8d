//! Class-balanced batch composition.
//!
//! The data loader lists the items of every class. The sampler draws
//! distinct classes at random and takes a few random items of each until
//! the batch is full.

use crate::common::*;

/// Batch composition options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, CopyGetters)]
pub struct SamplerConfig {
    /// Number of samples per batch.
    #[get_copy = "pub"]
    pub batch_size: usize,
    /// Number of distinct classes per batch.
    #[get_copy = "pub"]
    pub label_num: usize,
    /// Number of samples drawn from each class.
    #[get_copy = "pub"]
    pub sample_num: usize,
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<()> {
        let Self {
            batch_size,
            label_num,
            sample_num,
        } = *self;

        ensure!(batch_size > 0, "positive batch size required");
        ensure!(
            label_num.checked_mul(sample_num) == Some(batch_size),
            "label_num ({}) x sample_num ({}) must equal batch_size ({})",
            label_num,
            sample_num,
            batch_size
        );
        Ok(())
    }
}

/// The items of one class.
#[derive(Debug, Clone)]
pub struct ClassEntry<P> {
    pub label: i32,
    pub items: Vec<P>,
}

/// The selected samples of a batch.
#[derive(Debug, Clone, Getters)]
pub struct BatchComposition<P> {
    /// Items and their class labels, grouped by class in selection order.
    #[get = "pub"]
    samples: Vec<(P, i32)>,
    /// Catalog indices of the selected classes.
    #[get = "pub"]
    class_indices: Vec<usize>,
    /// Number of samples taken from each selected class.
    #[get = "pub"]
    per_class_counts: Vec<usize>,
}

impl<P> BatchComposition<P> {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn into_samples(self) -> Vec<(P, i32)> {
        self.samples
    }
}

#[derive(Debug, Clone, Getters)]
pub struct ClassBalancedSampler<P> {
    #[get = "pub"]
    config: SamplerConfig,
    #[get = "pub"]
    catalog: Vec<ClassEntry<P>>,
}

impl<P> ClassBalancedSampler<P>
where
    P: Clone,
{
    pub fn new(config: SamplerConfig, catalog: Vec<ClassEntry<P>>) -> Result<Self> {
        config.validate()?;
        ensure!(!catalog.is_empty(), "the class catalog is empty");
        let num_items: usize = catalog.iter().map(|entry| entry.items.len()).sum();
        ensure!(
            num_items >= config.batch_size,
            "the catalog holds {} items, fewer than the batch size {}",
            num_items,
            config.batch_size
        );
        Ok(Self { config, catalog })
    }

    /// Draws one batch.
    ///
    /// Fails if every class has been used before the batch is full.
    pub fn sample<R>(&self, rng: &mut R) -> Result<BatchComposition<P>>
    where
        R: Rng + ?Sized,
    {
        let SamplerConfig {
            batch_size,
            sample_num,
            ..
        } = self.config;

        let mut unused: Vec<usize> = (0..self.catalog.len()).collect();
        let mut samples = Vec::with_capacity(batch_size);
        let mut class_indices = vec![];
        let mut per_class_counts = vec![];

        while samples.len() < batch_size {
            ensure!(
                !unused.is_empty(),
                "ran out of classes after {} of {} samples",
                samples.len(),
                batch_size
            );

            let class_index = unused.swap_remove(rng.gen_range(0..unused.len()));
            let ClassEntry { label, ref items } = self.catalog[class_index];
            let count = sample_num
                .min(items.len())
                .min(batch_size - samples.len());

            samples.extend(
                items
                    .choose_multiple(rng, count)
                    .cloned()
                    .map(|item| (item, label)),
            );
            class_indices.push(class_index);
            per_class_counts.push(count);
        }

        debug!(
            "sampled {} items from classes {:?}",
            samples.len(),
            class_indices
        );

        Ok(BatchComposition {
            samples,
            class_indices,
            per_class_counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn catalog(sizes: &[usize]) -> Vec<ClassEntry<String>> {
        sizes
            .iter()
            .enumerate()
            .map(|(class, &size)| ClassEntry {
                label: class as i32 * 10,
                items: (0..size).map(|index| format!("{}/{}.jpg", class, index)).collect(),
            })
            .collect()
    }

    #[test]
    fn config_requires_consistent_sizes() {
        let config = SamplerConfig {
            batch_size: 12,
            label_num: 4,
            sample_num: 3,
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.label_num(), 4);

        let config = SamplerConfig {
            batch_size: 12,
            label_num: 5,
            sample_num: 3,
        };
        assert!(config.validate().is_err());

        let config = SamplerConfig {
            batch_size: 0,
            label_num: 0,
            sample_num: 3,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn batches_are_class_balanced() -> Result<()> {
        let config = SamplerConfig {
            batch_size: 12,
            label_num: 4,
            sample_num: 3,
        };
        let sampler = ClassBalancedSampler::new(config, catalog(&[5, 8, 3, 9, 4, 6]))?;
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..50 {
            let batch = sampler.sample(&mut rng)?;
            assert_eq!(batch.len(), 12);
            assert_eq!(batch.per_class_counts().iter().sum::<usize>(), 12);

            let distinct: HashSet<_> = batch.class_indices().iter().collect();
            assert_eq!(distinct.len(), batch.class_indices().len());

            let items: HashSet<_> = batch.samples().iter().map(|(item, _)| item).collect();
            assert_eq!(items.len(), 12);

            for (item, label) in batch.samples() {
                let class: i32 = item.split('/').next().unwrap().parse()?;
                assert_eq!(*label, class * 10);
            }
        }
        Ok(())
    }

    #[test]
    fn small_classes_pull_in_more_classes() -> Result<()> {
        let config = SamplerConfig {
            batch_size: 6,
            label_num: 2,
            sample_num: 3,
        };
        let sampler = ClassBalancedSampler::new(config, catalog(&[1, 1, 1, 1, 1, 1, 1]))?;
        let batch = sampler.sample(&mut StdRng::seed_from_u64(0))?;
        assert_eq!(batch.len(), 6);
        assert_eq!(batch.class_indices().len(), 6);
        assert!(batch.per_class_counts().iter().all(|&count| count == 1));
        Ok(())
    }

    #[test]
    fn exhausted_catalog_is_an_error() -> Result<()> {
        let config = SamplerConfig {
            batch_size: 6,
            label_num: 2,
            sample_num: 3,
        };
        assert!(ClassBalancedSampler::new(config.clone(), catalog(&[2, 2])).is_err());

        // enough items overall, but the per-class cap leaves the batch short
        let sampler = ClassBalancedSampler::new(config, catalog(&[6, 1]))?;
        assert!(sampler.sample(&mut StdRng::seed_from_u64(1)).is_err());
        Ok(())
    }
}
