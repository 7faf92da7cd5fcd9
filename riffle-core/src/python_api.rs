use pyo3::prelude::*;
use pyo3::types::PyBytes;

use crate::error::YielderError;
use crate::yielder::{self, config, RecordYielder};

fn to_py_err(e: YielderError) -> PyErr {
    if e.is_fatal() {
        pyo3::exceptions::PyValueError::new_err(e.to_string())
    } else {
        pyo3::exceptions::PyRuntimeError::new_err(e.to_string())
    }
}

#[pyclass(name = "RecordYielder")]
struct PyRecordYielder {
    inner: Box<dyn RecordYielder>,
}

#[pymethods]
impl PyRecordYielder {
    /// Returns `(payload, source_id)`, releasing the GIL while waiting
    fn yield_record(&self, py: Python<'_>) -> PyResult<(PyObject, usize)> {
        let record = py
            .allow_threads(|| self.inner.yield_record())
            .map_err(to_py_err)?;
        Ok((PyBytes::new(py, &record.data).into_py(py), record.source_id))
    }

    fn current_epoch(&self) -> u64 {
        self.inner.current_epoch()
    }

    fn kind(&self) -> String {
        self.inner.kind().to_string()
    }

    fn close(&self) {
        self.inner.close();
    }
}

#[pyfunction]
#[pyo3(signature = (
    file_pattern,
    input_source_weights = Vec::new(),
    file_random_seed = config::DEFAULT_FILE_RANDOM_SEED,
    file_buffer_size = config::DEFAULT_FILE_BUFFER_SIZE,
    file_parallelism = config::DEFAULT_FILE_PARALLELISM,
    require_sequential_order = false,
    use_chaining = false
))]
#[allow(clippy::too_many_arguments)]
fn construct_yielder(
    py: Python<'_>,
    file_pattern: String,
    input_source_weights: Vec<f32>,
    file_random_seed: i64,
    file_buffer_size: i64,
    file_parallelism: i64,
    require_sequential_order: bool,
    use_chaining: bool,
) -> PyResult<PyRecordYielder> {
    let inner = py
        .allow_threads(|| {
            yielder::construct_yielder(
                &file_pattern,
                &input_source_weights,
                file_random_seed,
                file_buffer_size,
                file_parallelism,
                require_sequential_order,
                use_chaining,
            )
        })
        .map_err(to_py_err)?;
    Ok(PyRecordYielder { inner })
}

/// A Python module implemented in Rust.
#[pymodule]
pub fn riffle_core(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyRecordYielder>()?;
    m.add_function(wrap_pyfunction!(construct_yielder, m)?)?;
    Ok(())
}
