use std::process::Command;

#[test]
fn fails_without_jwt_secret() {
    let exe = env!("CARGO_BIN_EXE_arx-backend");
    let output = Command::new(exe)
        .env_remove("JWT_SECRET")
        .env("DATABASE_URL", "sqlite::memory:")
        .output()
        .expect("failed to run arx-backend binary");
    assert!(!output.status.success());
}
