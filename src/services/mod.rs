pub mod ai_service;
pub mod corpus_service;
pub mod embed_service;
pub mod exam_service;
pub mod index_service;
pub mod prompt_service;
pub mod retrieval_service;
pub mod sampler_service;
pub mod storage_service;
