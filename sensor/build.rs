use std::env;
use std::fmt::Write;
use std::fs;
use std::path::PathBuf;

/// (name, default, description)
static CONFIGS: &[(&str, usize, &str)] = &[
    (
        "NOTIFICATION_QUEUE_SIZE",
        8,
        "Number of accepted notifications waiting for deferred processing",
    ),
    (
        "MAX_NOTIFICATION_LEN",
        512,
        "Largest notification payload copied into a deferred record",
    ),
];

const PREFIX: &str = "BLE_SENSOR_";

fn main() {
    let mut data = String::new();

    for (name, default, description) in CONFIGS {
        let var = format!("{PREFIX}{name}");
        println!("cargo:rerun-if-env-changed={var}");

        let value = match env::var(&var) {
            Ok(raw) => match raw.parse::<usize>() {
                Ok(value) if value > 0 => value,
                _ => panic!("{var} must be a positive integer, got {raw:?}"),
            },
            Err(_) => *default,
        };

        writeln!(data, "/// {description}").unwrap();
        writeln!(data, "pub const {name}: usize = {value};").unwrap();
    }

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").unwrap());
    fs::write(out_dir.join("config.rs"), data).unwrap();
    println!("cargo:rerun-if-changed=build.rs");
}
