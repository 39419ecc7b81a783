pub mod sample_repo;
