use dicelang::{Interpreter, Options};
use std::io::{self, BufRead, Write};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut interpreter = Interpreter::new(rand::thread_rng(), Options::default().with_decorators(true));
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    print!("> ");
    io::stdout().flush()?;
    while let Some(Ok(line)) = lines.next() {
        let line = line.trim();
        if !line.is_empty() {
            let result = interpreter.roll(line);
            for why in &result.errors {
                eprintln!("Error: {}", why);
            }
            println!("{}", result);
            if result.successes != 0 || result.failures != 0 {
                println!("successes: {}, failures: {}", result.successes, result.failures);
            }
        }
        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}
