//! Image Pipeline and Batching
//!
//! Turns image files into fixed-shape tensors and groups processed samples
//! into batches for the Burn framework. Training data is shuffled with a
//! single seeded permutation before batching; validation and test data keep
//! their input order so downstream evaluation lines up with the held label
//! reference.

use std::path::Path;

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;
use image::imageops::FilterType;
use image::ImageReader;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::dataset::vocab::{argmax, BreedVocabulary, Sample};
use crate::utils::error::{DogBreedError, Result};
use crate::IMG_SIZE;

/// A decoded image as a fixed-shape numeric array.
///
/// Data is laid out height × width × channels (RGB), values in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub data: Vec<f32>,
    pub size: usize,
}

impl ImageTensor {
    /// Tensor shape as (height, width, channels)
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.size, self.size, 3)
    }
}

/// Read, decode, normalize, and resize an image to `IMG_SIZE` square.
///
/// Fails with `ImageDecode` if the file is unreadable or not a decodable
/// image format.
pub fn process_image(path: &Path) -> Result<ImageTensor> {
    process_image_sized(path, IMG_SIZE)
}

/// `process_image` with a custom edge length (used by tests and the model's
/// configurable input size).
pub fn process_image_sized(path: &Path, size: usize) -> Result<ImageTensor> {
    let rgb = ImageReader::open(path)
        .map_err(|e| DogBreedError::image_decode(path, e))?
        .decode()
        .map_err(|e| DogBreedError::image_decode(path, e))?
        .resize_exact(size as u32, size as u32, FilterType::Triangle)
        .to_rgb8();

    // Row-major pixel walk gives HWC layout directly.
    let mut data = vec![0.0f32; size * size * 3];
    for (i, pixel) in rgb.pixels().enumerate() {
        data[i * 3] = pixel[0] as f32 / 255.0;
        data[i * 3 + 1] = pixel[1] as f32 / 255.0;
        data[i * 3 + 2] = pixel[2] as f32 / 255.0;
    }

    Ok(ImageTensor { data, size })
}

/// A single processed sample ready for batching
#[derive(Debug, Clone)]
pub struct DogItem {
    /// Decoded image tensor
    pub image: ImageTensor,
    /// One-hot encoded breed label, absent for test/custom samples
    pub one_hot: Option<Vec<f32>>,
    /// Source path (for error reporting and ordering checks)
    pub path: String,
}

impl DogItem {
    /// Create an item from pre-decoded data
    pub fn from_data(image: ImageTensor, one_hot: Option<Vec<f32>>, path: String) -> Self {
        Self {
            image,
            one_hot,
            path,
        }
    }
}

/// Process samples into items, encoding labels against the vocabulary.
///
/// Labeled samples require a vocabulary; a missing or corrupt image aborts
/// the whole load with `ImageDecode`, leaving no partial batch behind.
pub fn load_items(
    samples: &[Sample],
    vocab: Option<&BreedVocabulary>,
    image_size: usize,
) -> Result<Vec<DogItem>> {
    let mut items = Vec::with_capacity(samples.len());
    for sample in samples {
        let image = process_image_sized(&sample.path, image_size)?;
        let one_hot = match (&sample.breed, vocab) {
            (Some(breed), Some(vocab)) => Some(vocab.encode(breed)?),
            (Some(breed), None) => {
                return Err(DogBreedError::Encoding(format!(
                    "sample '{}' carries label '{}' but no vocabulary was provided",
                    sample.path.display(),
                    breed
                )))
            }
            (None, _) => None,
        };
        items.push(DogItem::from_data(
            image,
            one_hot,
            sample.path.to_string_lossy().to_string(),
        ));
    }
    Ok(items)
}

/// A batch of images (and labels, when present) on the target device
#[derive(Clone, Debug)]
pub struct DogBatch<B: Backend> {
    /// Images with shape [batch_size, 3, height, width]
    pub images: Tensor<B, 4>,
    /// Class-index targets with shape [batch_size]; absent for unlabeled data
    pub targets: Option<Tensor<B, 1, Int>>,
    /// Number of samples in this batch
    pub size: usize,
}

/// Batcher converting processed items into device tensors
#[derive(Clone, Debug)]
pub struct DogBatcher<B: Backend> {
    device: B::Device,
    image_size: usize,
}

impl<B: Backend> DogBatcher<B> {
    /// Create a batcher for the given device with the default image size
    pub fn new(device: B::Device) -> Self {
        Self {
            device,
            image_size: IMG_SIZE,
        }
    }

    /// Create a batcher with a custom image size
    pub fn with_image_size(device: B::Device, image_size: usize) -> Self {
        Self { device, image_size }
    }
}

impl<B: Backend> Batcher<DogItem, DogBatch<B>> for DogBatcher<B> {
    fn batch(&self, items: Vec<DogItem>) -> DogBatch<B> {
        let batch_size = items.len();
        let (height, width) = (self.image_size, self.image_size);

        // HWC items -> a single NCHW buffer for the convolutional backbone
        let mut images_data = vec![0.0f32; batch_size * 3 * height * width];
        for (n, item) in items.iter().enumerate() {
            let base = n * 3 * height * width;
            for y in 0..height {
                for x in 0..width {
                    let hwc = (y * width + x) * 3;
                    for c in 0..3 {
                        images_data[base + c * height * width + y * width + x] =
                            item.image.data[hwc + c];
                    }
                }
            }
        }

        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, 3, height, width]),
            &self.device,
        );

        // Integer class targets come from the one-hot arg-max, only when
        // every item in the batch is labeled.
        let targets = if items.iter().all(|i| i.one_hot.is_some()) && batch_size > 0 {
            let targets_data: Vec<i64> = items
                .iter()
                .map(|item| {
                    item.one_hot
                        .as_ref()
                        .and_then(|one_hot| argmax(one_hot))
                        .unwrap_or(0) as i64
                })
                .collect();
            Some(Tensor::<B, 1, Int>::from_data(
                TensorData::new(targets_data, [batch_size]),
                &self.device,
            ))
        } else {
            None
        };

        DogBatch {
            images,
            targets,
            size: batch_size,
        }
    }
}

/// Group items into chunks of `batch_size`; the final chunk may be shorter.
/// Unshuffled input order is preserved exactly.
pub fn chunk_items(items: Vec<DogItem>, batch_size: usize) -> Vec<Vec<DogItem>> {
    let mut chunks = Vec::new();
    let mut current = Vec::with_capacity(batch_size.min(items.len()));
    for item in items {
        current.push(item);
        if current.len() == batch_size {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Create tensor batches from processed items.
///
/// When `shuffle_seed` is set the full sample order is permuted once before
/// batching (training data only); otherwise the input order is preserved.
pub fn create_batches<B: Backend>(
    batcher: &DogBatcher<B>,
    mut items: Vec<DogItem>,
    batch_size: usize,
    shuffle_seed: Option<u64>,
) -> Result<Vec<DogBatch<B>>> {
    if batch_size == 0 {
        return Err(DogBreedError::Config("batch size must be non-zero".to_string()));
    }

    if let Some(seed) = shuffle_seed {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        items.shuffle(&mut rng);
    }

    Ok(chunk_items(items, batch_size)
        .into_iter()
        .map(|chunk| batcher.batch(chunk))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use std::path::PathBuf;

    fn dummy_item(index: usize, size: usize, one_hot: Option<Vec<f32>>) -> DogItem {
        DogItem::from_data(
            ImageTensor {
                data: vec![0.5; size * size * 3],
                size,
            },
            one_hot,
            format!("img_{}.jpg", index),
        )
    }

    fn write_temp_image(name: &str, width: u32, height: u32) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        image::DynamicImage::new_rgb8(width, height)
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_process_image_shape_and_range() {
        let path = write_temp_image("dogbreed_pipeline_shape.png", 50, 40);
        let tensor = process_image(&path).unwrap();

        assert_eq!(tensor.shape(), (224, 224, 3));
        assert_eq!(tensor.data.len(), 224 * 224 * 3);
        assert!(tensor.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_image_is_image_decode_error() {
        let err = process_image(Path::new("/nonexistent/dog.jpg")).unwrap_err();
        assert!(matches!(err, DogBreedError::ImageDecode { .. }));
    }

    #[test]
    fn test_corrupt_image_is_image_decode_error() {
        let path = std::env::temp_dir().join("dogbreed_pipeline_corrupt.jpg");
        std::fs::write(&path, b"this is not a jpeg").unwrap();
        let err = process_image(&path).unwrap_err();
        assert!(matches!(err, DogBreedError::ImageDecode { .. }));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_items_aborts_on_missing_file() {
        let samples = vec![Sample {
            path: PathBuf::from("/nonexistent/dog.jpg"),
            breed: None,
        }];
        assert!(load_items(&samples, None, 32).is_err());
    }

    #[test]
    fn test_chunk_sizes_and_coverage() {
        let items: Vec<DogItem> = (0..10).map(|i| dummy_item(i, 4, None)).collect();
        let chunks = chunk_items(items, 4);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 4);
        assert_eq!(chunks[1].len(), 4);
        assert_eq!(chunks[2].len(), 2);

        // Concatenating the chunks reconstructs the original sequence
        let flat: Vec<String> = chunks
            .into_iter()
            .flatten()
            .map(|item| item.path)
            .collect();
        let expected: Vec<String> = (0..10).map(|i| format!("img_{}.jpg", i)).collect();
        assert_eq!(flat, expected);
    }

    #[test]
    fn test_batch_tensor_dims_and_targets() {
        let device = Default::default();
        let batcher = DogBatcher::<DefaultBackend>::with_image_size(device, 8);

        let items = vec![
            dummy_item(0, 8, Some(vec![1.0, 0.0])),
            dummy_item(1, 8, Some(vec![0.0, 1.0])),
            dummy_item(2, 8, Some(vec![0.0, 1.0])),
        ];
        let batch = batcher.batch(items);

        assert_eq!(batch.images.dims(), [3, 3, 8, 8]);
        assert_eq!(batch.size, 3);
        let targets: Vec<i64> = batch
            .targets
            .unwrap()
            .into_data()
            .to_vec()
            .unwrap();
        assert_eq!(targets, vec![0, 1, 1]);
    }

    #[test]
    fn test_unlabeled_batch_has_no_targets() {
        let device = Default::default();
        let batcher = DogBatcher::<DefaultBackend>::with_image_size(device, 8);
        let batch = batcher.batch(vec![dummy_item(0, 8, None)]);
        assert!(batch.targets.is_none());
    }

    #[test]
    fn test_create_batches_shuffle_is_deterministic() {
        let device = Default::default();
        let batcher = DogBatcher::<DefaultBackend>::with_image_size(device, 4);

        let items: Vec<DogItem> = (0..6)
            .map(|i| dummy_item(i, 4, Some(vec![1.0, 0.0])))
            .collect();

        let a = create_batches(&batcher, items.clone(), 2, Some(9)).unwrap();
        let b = create_batches(&batcher, items, 2, Some(9)).unwrap();

        assert_eq!(a.len(), 3);
        for (x, y) in a.iter().zip(b.iter()) {
            let tx: Vec<i64> = x.targets.clone().unwrap().into_data().to_vec().unwrap();
            let ty: Vec<i64> = y.targets.clone().unwrap().into_data().to_vec().unwrap();
            assert_eq!(tx, ty);
        }
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let device = Default::default();
        let batcher = DogBatcher::<DefaultBackend>::with_image_size(device, 4);
        let err = create_batches(&batcher, vec![dummy_item(0, 4, None)], 0, None).unwrap_err();
        assert!(matches!(err, DogBreedError::Config(_)));
    }
}
