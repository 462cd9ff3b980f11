//! Breed Classifier Network
//!
//! A convolutional backbone feeding a linear classification head, built with
//! the Burn framework. In transfer-learning mode the backbone is frozen and
//! only the head receives gradient updates, mirroring the classic
//! pretrained-feature-extractor setup.

use burn::{
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    record::{CompactRecorder, Recorder},
    tensor::{backend::Backend, Tensor},
};

use crate::model::config::ModelConfig;
use crate::utils::error::{DogBreedError, Result};

/// A convolutional block: Conv2d, BatchNorm, ReLU, MaxPool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B, 2>,
    relu: Relu,
    pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let bn = BatchNormConfig::new(out_channels).init(device);
        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

        Self {
            conv,
            bn,
            relu: Relu::new(),
            pool,
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);
        self.pool.forward(x)
    }
}

/// Convolutional backbone producing a fixed-size feature vector
#[derive(Module, Debug)]
pub struct FeatureExtractor<B: Backend> {
    conv1: ConvBlock<B>,
    conv2: ConvBlock<B>,
    conv3: ConvBlock<B>,
    conv4: ConvBlock<B>,
    global_pool: AdaptiveAvgPool2d,
}

impl<B: Backend> FeatureExtractor<B> {
    fn new(base_filters: usize, device: &B::Device) -> Self {
        let base = base_filters;

        // Channel progression 3 -> base -> 2x -> 4x -> 8x, halving the
        // spatial size at each block
        let conv1 = ConvBlock::new(3, base, device);
        let conv2 = ConvBlock::new(base, base * 2, device);
        let conv3 = ConvBlock::new(base * 2, base * 4, device);
        let conv4 = ConvBlock::new(base * 4, base * 8, device);

        let global_pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();

        Self {
            conv1,
            conv2,
            conv3,
            conv4,
            global_pool,
        }
    }

    /// Extract features: [B, 3, H, W] -> [B, base_filters * 8]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);
        let x = self.conv4.forward(x);

        let x = self.global_pool.forward(x);

        let [batch_size, channels, _, _] = x.dims();
        x.reshape([batch_size, channels])
    }
}

/// Dog breed classifier: backbone features plus a linear softmax head
#[derive(Module, Debug)]
pub struct BreedClassifier<B: Backend> {
    pub features: FeatureExtractor<B>,
    pub head: Linear<B>,
    freeze_backbone: bool,
    num_classes: usize,
}

impl<B: Backend> BreedClassifier<B> {
    /// Forward pass producing raw logits of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let features = self.features.forward(x);
        // Detaching cuts the gradient path, so a frozen backbone never
        // receives optimizer updates.
        let features = if self.freeze_backbone {
            features.detach()
        } else {
            features
        };
        self.head.forward(features)
    }

    /// Forward pass with softmax, for inference probabilities
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(x);
        burn::tensor::activation::softmax(logits, 1)
    }

    /// Number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Whether the backbone is frozen
    pub fn is_backbone_frozen(&self) -> bool {
        self.freeze_backbone
    }
}

impl ModelConfig {
    /// Build a classifier from this configuration, loading pretrained
    /// backbone weights when a record path is configured.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<BreedClassifier<B>> {
        self.validate()?;

        let mut features = FeatureExtractor::new(self.base_filters, device);
        if let Some(path) = &self.pretrained {
            let record = CompactRecorder::new()
                .load(path.clone(), device)
                .map_err(|e| DogBreedError::persistence(path, e))?;
            features = features.load_record(record);
        }

        let head = LinearConfig::new(self.base_filters * 8, self.num_classes).init(device);

        Ok(BreedClassifier {
            features,
            head,
            freeze_backbone: self.freeze_backbone,
            num_classes: self.num_classes,
        })
    }
}
