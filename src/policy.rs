use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use burn::module::Param;
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::tensor::activation::{relu, tanh};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use burn_ndarray::{NdArray, NdArrayDevice};
use rand::Rng;

use crate::env::{Observation, ACTION_DIM, OBSERVATION_DIM};
use crate::error::CheckpointError;

pub const INPUT_SIZE: usize = OBSERVATION_DIM;
pub const HIDDEN_SIZE: usize = 32;
pub const OUTPUT_SIZE: usize = ACTION_DIM;

/// Weights and biases of both layers.
pub const PARAM_COUNT: usize =
    INPUT_SIZE * HIDDEN_SIZE + HIDDEN_SIZE + HIDDEN_SIZE * OUTPUT_SIZE + OUTPUT_SIZE;

type B = NdArray;

fn device() -> NdArrayDevice {
    NdArrayDevice::Cpu
}

/// Seeds burn's parameter initializer so freshly created policies are reproducible.
pub fn seed_initializer(seed: u64) {
    B::seed(seed);
}

/// Feedforward policy: observation → hidden (ReLU) → leg rates (tanh, in [-1, 1]).
#[derive(Debug, Clone)]
pub struct Policy {
    input_hidden: Linear<B>,
    hidden_output: Linear<B>,
}

impl Policy {
    /// Xavier-uniform initialization, U(-a, a) with a = gain * sqrt(6 / (fan_in + fan_out)).
    pub fn new(ih_gain: f64, ho_gain: f64) -> Self {
        let device = device();
        let input_hidden = LinearConfig::new(INPUT_SIZE, HIDDEN_SIZE)
            .with_initializer(Initializer::XavierUniform { gain: ih_gain })
            .init(&device);
        let hidden_output = LinearConfig::new(HIDDEN_SIZE, OUTPUT_SIZE)
            .with_initializer(Initializer::XavierUniform { gain: ho_gain })
            .init(&device);
        Self {
            input_hidden,
            hidden_output,
        }
    }

    pub fn new_random() -> Self {
        Self::new(1.0, 1.0)
    }

    /// Rebuilds a policy from a flat parameter vector laid out as
    /// `[input_hidden.weight] [input_hidden.bias] [hidden_output.weight] [hidden_output.bias]`.
    /// Returns `None` when the length does not match [`PARAM_COUNT`].
    pub fn from_params(params: &[f32]) -> Option<Self> {
        if params.len() != PARAM_COUNT {
            return None;
        }
        let device = device();
        let (ih_w, rest) = params.split_at(INPUT_SIZE * HIDDEN_SIZE);
        let (ih_b, rest) = rest.split_at(HIDDEN_SIZE);
        let (ho_w, ho_b) = rest.split_at(HIDDEN_SIZE * OUTPUT_SIZE);

        let mut policy = Self::new(1.0, 1.0);
        policy.input_hidden.weight = Param::from_tensor(
            Tensor::<B, 1>::from_floats(ih_w, &device).reshape([INPUT_SIZE, HIDDEN_SIZE]),
        );
        policy.input_hidden.bias = Some(Param::from_tensor(Tensor::<B, 1>::from_floats(
            ih_b, &device,
        )));
        policy.hidden_output.weight = Param::from_tensor(
            Tensor::<B, 1>::from_floats(ho_w, &device).reshape([HIDDEN_SIZE, OUTPUT_SIZE]),
        );
        policy.hidden_output.bias = Some(Param::from_tensor(Tensor::<B, 1>::from_floats(
            ho_b, &device,
        )));
        Some(policy)
    }

    /// All parameters in checkpoint order.
    pub fn params(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(PARAM_COUNT);
        for layer in [&self.input_hidden, &self.hidden_output] {
            out.extend(layer.weight.val().into_data().iter::<f32>());
            if let Some(bias) = &layer.bias {
                out.extend(bias.val().into_data().iter::<f32>());
            }
        }
        out
    }

    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        assert_eq!(input.len(), INPUT_SIZE, "policy input must have {INPUT_SIZE} elements");
        let device = device();
        let x: Tensor<B, 2> = Tensor::<B, 1>::from_floats(input, &device).reshape([1, INPUT_SIZE]);
        let hidden = relu(self.input_hidden.forward(x));
        let output = tanh(self.hidden_output.forward(hidden)).into_data();
        output.iter::<f32>().collect()
    }

    pub fn act(&self, observation: &Observation) -> [f32; ACTION_DIM] {
        let out = self.forward(observation.as_slice());
        let mut action = [0.0; ACTION_DIM];
        for (a, o) in action.iter_mut().zip(out) {
            *a = o;
        }
        action
    }

    /// Copy where each parameter is perturbed with probability `rate` by U(-strength, strength).
    pub fn mutated<R: Rng + ?Sized>(&self, rate: f32, strength: f32, rng: &mut R) -> Self {
        let mut params = self.params();
        for p in params.iter_mut() {
            if rng.gen::<f32>() < rate {
                *p += rng.gen_range(-strength..=strength);
            }
        }
        Self::from_params(&params).unwrap_or_else(|| self.clone())
    }

    /// Writes all parameters as raw little-endian f32.
    pub fn save(&self, path: &Path) -> Result<(), CheckpointError> {
        let io_err = |source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut file = BufWriter::new(File::create(path).map_err(io_err)?);
        for v in self.params() {
            file.write_all(&v.to_le_bytes()).map_err(io_err)?;
        }
        file.flush().map_err(io_err)
    }

    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        if !path.is_file() {
            return Err(CheckpointError::NotFound(path.to_path_buf()));
        }
        let mut buffer = Vec::new();
        File::open(path)
            .map(BufReader::new)
            .and_then(|mut r| r.read_to_end(&mut buffer))
            .map_err(|source| CheckpointError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let size_mismatch = || CheckpointError::SizeMismatch {
            path: path.to_path_buf(),
            got: buffer.len(),
            expected: PARAM_COUNT * 4,
        };
        if buffer.len() != PARAM_COUNT * 4 {
            return Err(size_mismatch());
        }
        let params: Vec<f32> = buffer
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::from_params(&params).ok_or_else(size_mismatch)
    }
}
