use std::path::{Path, PathBuf};

pub fn out_log(work_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    PathBuf::from(work_dir.as_ref()).join(format!("{name}.out"))
}

pub fn out_err(work_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    PathBuf::from(work_dir.as_ref()).join(format!("{name}.err"))
}

pub fn gate_template(netlist_dir: impl AsRef<Path>, gate: &str) -> PathBuf {
    PathBuf::from(netlist_dir.as_ref()).join(format!("{gate}.cir"))
}

pub fn param_file(netlist_dir: impl AsRef<Path>) -> PathBuf {
    PathBuf::from(netlist_dir.as_ref()).join("params.spice")
}
