use std::io::{self, Write};

use anyhow::Result;

pub fn username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    Ok(username.trim().to_string())
}

pub fn password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    Ok(password)
}
