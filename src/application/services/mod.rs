pub mod commit_counter;
