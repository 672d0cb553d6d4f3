#[cfg(test)]
#[macro_use]
extern crate assert_approx_eq;

pub type DenseVec = ndarray::Array1<f64>;
pub type DenseVecView<'a> = ndarray::ArrayView1<'a, f64>;
pub type DenseMat = ndarray::Array2<f64>;
pub type DenseMatView<'a> = ndarray::ArrayView2<'a, f64>;
pub type DataSet = data::DataSet;
pub type Model = model::Model;
pub use error::{Error, Result};

pub mod data;
pub mod error;
mod mat_util;
pub mod model;
mod util;
