use convnet_core::internal::*;

/// Construction parameters of an Inception network.
#[derive(Debug, Clone, PartialEq)]
pub struct InceptionConfig {
    /// Height and width of the input images.
    pub image_size: usize,
    pub batch_size: usize,
    pub data_format: DataFormat,
    /// Build the auxiliary classification head (inception3 only).
    pub auxiliary: bool,
    pub use_batch_norm: bool,
    pub batch_norm: BatchNormConfig,
    /// Dropout layers are only wired when training.
    pub phase_train: bool,
}

impl Default for InceptionConfig {
    fn default() -> InceptionConfig {
        InceptionConfig {
            image_size: 299,
            batch_size: 32,
            data_format: DataFormat::NHWC,
            auxiliary: false,
            use_batch_norm: true,
            batch_norm: BatchNormConfig::default(),
            phase_train: true,
        }
    }
}

impl InceptionConfig {
    pub fn with_image_size(mut self, image_size: usize) -> Self {
        self.image_size = image_size;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_data_format(mut self, data_format: DataFormat) -> Self {
        self.data_format = data_format;
        self
    }

    pub fn with_auxiliary(mut self, auxiliary: bool) -> Self {
        self.auxiliary = auxiliary;
        self
    }

    pub fn with_batch_norm(mut self, use_batch_norm: bool) -> Self {
        self.use_batch_norm = use_batch_norm;
        self
    }

    pub fn with_batch_norm_config(mut self, batch_norm: BatchNormConfig) -> Self {
        self.batch_norm = batch_norm;
        self
    }

    pub fn with_phase_train(mut self, phase_train: bool) -> Self {
        self.phase_train = phase_train;
        self
    }

    pub fn validate(&self) -> NetResult<()> {
        if self.image_size == 0 || self.batch_size == 0 {
            bail!(NetError::InvalidParameter(format!(
                "image size ({}) and batch size ({}) must be positive",
                self.image_size, self.batch_size
            )))
        }
        Ok(())
    }
}
