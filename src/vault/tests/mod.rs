mod index_tests;
mod vault_tests;
