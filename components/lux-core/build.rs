use std::path::PathBuf;

fn env_or(name: &str, default: u64) -> u64 {
    println!("cargo:rerun-if-env-changed={name}");
    match std::env::var(name) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| panic!("{name} must be an unsigned integer, got '{value}'")),
        Err(_) => default,
    }
}

fn main() {
    let sample_period_ms = env_or("LUX_SAMPLE_PERIOD_MS", 1000);
    let report_period_ms = env_or("LUX_REPORT_PERIOD_MS", 100);
    let sensor_settle_ms = env_or("LUX_SENSOR_SETTLE_MS", 100);
    let sensor_bus_hz = u32::try_from(env_or("LUX_SENSOR_BUS_HZ", 400_000)).expect("LUX_SENSOR_BUS_HZ must fit in a u32");

    let out_dir_path = PathBuf::from(std::env::var_os("OUT_DIR").unwrap());
    let out_file_path = out_dir_path.join("consts.rs");

    std::fs::write(
        out_file_path,
        format!(
            "
            // generated from env vars
            pub const SAMPLE_PERIOD_MS: u64 = {sample_period_ms};
            pub const REPORT_PERIOD_MS: u64 = {report_period_ms};
            pub const SENSOR_SETTLE_MS: u64 = {sensor_settle_ms};
            pub const SENSOR_BUS_HZ: u32 = {sensor_bus_hz};"
        ),
    )
    .unwrap();
}
