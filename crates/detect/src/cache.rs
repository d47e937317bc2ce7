use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use crate::onnx::OnnxNetwork;
use crate::DetectError;

static MODEL_CACHE: OnceLock<Mutex<HashMap<PathBuf, Arc<OnnxNetwork>>>> = OnceLock::new();

/// Load a model once per process and hand out shared handles.
pub(crate) fn get_or_load_network(path: &Path) -> Result<Arc<OnnxNetwork>, DetectError> {
    let cache = MODEL_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache = cache
        .lock()
        .map_err(|_| DetectError::Inference("model cache lock poisoned".into()))?;

    if let Some(network) = cache.get(path) {
        return Ok(Arc::clone(network));
    }

    let network = Arc::new(OnnxNetwork::load(path)?);
    cache.insert(path.to_path_buf(), Arc::clone(&network));
    Ok(network)
}
