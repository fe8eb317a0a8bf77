// Resume analysis: PDF upload sent inline to the model with a prompt template.

pub mod analysis;
pub mod handlers;
