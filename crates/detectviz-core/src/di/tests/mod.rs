pub mod container_tests;
