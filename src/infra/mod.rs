pub mod dataset_client;
