//! Prints the ASecret and AGenerator CRDs as a multi-document YAML stream.
//!
//! ```sh
//! cargo run --bin crdgen > config/crd/crds.yaml
//! ```

use kube::core::CustomResourceExt;
use secret_sync_controller::crd::{AGenerator, ASecret};

fn main() -> Result<(), serde_yaml::Error> {
    let asecret = serde_yaml::to_string(&ASecret::crd())?;
    let agenerator = serde_yaml::to_string(&AGenerator::crd())?;
    print!("---\n{asecret}---\n{agenerator}");
    Ok(())
}
