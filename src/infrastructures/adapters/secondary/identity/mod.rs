pub mod github_oauth;
