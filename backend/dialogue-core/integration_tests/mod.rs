mod dialogue_tests;
