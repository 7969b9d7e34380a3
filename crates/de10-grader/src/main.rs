//! Command-line grader: run one submitted object image against one
//! exercise from the catalog.
//!
//! ```text
//! de10-grader --list
//! de10-grader --show <exercise-id>
//! de10-grader <exercise-id> <image.json>
//! ```
//!
//! Exit status 0 means the submission passed.

use std::fs;
use std::process::ExitCode;

use de10_grader::catalog;
use format_objimg::ObjectImage;

fn usage() {
    eprintln!("usage: de10-grader --list");
    eprintln!("       de10-grader --show <exercise-id>");
    eprintln!("       de10-grader <exercise-id> <image.json>");
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let exercises = catalog();

    match args.as_slice() {
        [flag] if flag == "--list" => {
            for exercise in &exercises {
                println!(
                    "{:<12} [{}] {}",
                    exercise.id, exercise.difficulty, exercise.title
                );
            }
            ExitCode::SUCCESS
        }
        [flag, exercise_id] if flag == "--show" => {
            let Some(exercise) = exercises.iter().find(|e| e.id == *exercise_id) else {
                eprintln!("Exercise ID not found: {exercise_id}");
                return ExitCode::FAILURE;
            };
            println!("{} [{}]", exercise.title, exercise.difficulty);
            println!();
            println!("{}", exercise.description);
            println!();
            println!("Starter code:");
            print!("{}", exercise.starter);
            ExitCode::SUCCESS
        }
        [exercise_id, image_path] => {
            let Some(exercise) = exercises.iter().find(|e| e.id == *exercise_id) else {
                eprintln!("Exercise ID not found: {exercise_id}");
                return ExitCode::FAILURE;
            };

            let text = match fs::read_to_string(image_path) {
                Ok(text) => text,
                Err(err) => {
                    eprintln!("Error reading {image_path}: {err}");
                    return ExitCode::FAILURE;
                }
            };
            let image = match ObjectImage::from_json(&text) {
                Ok(image) => image,
                Err(err) => {
                    eprintln!("Error: {err}");
                    return ExitCode::FAILURE;
                }
            };
            if image.symbol("_start").is_none() {
                println!(
                    "No _start in your code (did you forget to enter instructions?)"
                );
                return ExitCode::FAILURE;
            }

            let verdict = (exercise.checker)(&image);
            println!(
                "{}: {}",
                exercise.id,
                if verdict.passed { "PASS" } else { "FAIL" }
            );
            print!("{}", verdict.feedback);
            if let Some(extra) = verdict.extra {
                println!("{extra}");
            }
            if verdict.passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        _ => {
            usage();
            ExitCode::FAILURE
        }
    }
}
