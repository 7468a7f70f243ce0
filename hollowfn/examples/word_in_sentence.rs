//! End-to-end hollow function example against DeepSeek.
//!
//! Registers a function whose "body" is a prompt template plus an output
//! schema, then invokes it twice with the same arguments to show the cache
//! short-circuiting the second dispatch.

use hollowfn::prelude::*;
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let api_key =
        std::env::var("DEEPSEEK_API_KEY").expect("DEEPSEEK_API_KEY environment variable not set");

    let provider = hollowfn::provider::deepseek(api_key)?;

    let runtime = HollowRuntime::builder(provider)
        .layer(LoggingLayer::new())
        .cache(CacheConfig::new().with_capacity(64))
        .finish();

    runtime.register(
        FunctionSpec::new(
            "word_in_sentence",
            PromptTemplate::parse("Is the word '{word}' used in '{sentence}'? Answer as JSON."),
            OutputSchema::record([("wordInSentence", OutputSchema::Boolean)]),
        )
        .with_max_tokens(64)
        .with_temperature(0.1)
        .with_retry(RetryPolicy::new().with_max_attempts(3)),
    )?;

    let arguments: Arguments = [
        ("word".to_string(), json!("orange")),
        ("sentence".to_string(), json!("I love eating oranges.")),
    ]
    .into();

    println!("=== First invocation (dispatches to the provider) ===");
    match runtime.invoke("word_in_sentence", arguments.clone()).await {
        InvocationResult::Success { value, usage } => {
            println!("Value: {}", value);
            if let Some(usage) = usage {
                println!("Tokens used: {}", usage.total_tokens);
            }
        }
        InvocationResult::Failed { kind, message, raw_snippet } => {
            eprintln!("Failed ({:?}): {}", kind, message);
            if let Some(snippet) = raw_snippet {
                eprintln!("Raw response: {}", snippet);
            }
        }
    }

    println!("\n=== Second invocation (served from cache) ===");
    let cached = runtime.invoke("word_in_sentence", arguments).await;
    println!("Value: {:?}", cached.value());

    Ok(())
}
