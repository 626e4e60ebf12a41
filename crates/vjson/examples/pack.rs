//! Example: the latest version stores a number as a hex string.

use serde::{Deserialize, Serialize};
use vjson::{HookError, Pack, Registry, Shape, Unpack};

#[derive(Shape, Debug, Default)]
struct Example {
    value: u64,
}

#[derive(Shape, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExampleV1 {
    value: String,
}

impl Pack<Example> for ExampleV1 {
    fn pack(&mut self, live: &Example) -> Result<(), HookError> {
        self.value = format!("{:x}", live.value);
        Ok(())
    }
}

impl Unpack<Example> for ExampleV1 {
    fn unpack(&self, live: &mut Example) -> Result<(), HookError> {
        live.value = u64::from_str_radix(&self.value, 16)?;
        Ok(())
    }
}

fn main() -> Result<(), vjson::Error> {
    let mut registry = Registry::new();
    registry
        .register::<Example>()
        .version::<ExampleV1>()
        .with_pack()
        .with_unpack()
        .finish()?;

    let input = r#"{ "Value": "42" }"#;

    let example: Example = vjson::from_str(&registry, input)?;
    let output = vjson::to_string(&registry, &example)?;

    println!("Data: {example:?}");
    println!("Output: {output}");

    // Unpack errors are returned as they are.
    if let Err(err) = vjson::from_str::<Example>(&registry, r#"{ "Value": "xyz" }"#) {
        println!("Error: {err}");
    }
    Ok(())
}
