//! Writing-assist endpoints: thin proxies from form fields to the LLM.

pub mod handlers;
pub mod prompts;
