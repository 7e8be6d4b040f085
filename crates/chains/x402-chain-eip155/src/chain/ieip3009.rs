//! Solidity interface bindings for the ERC-3009 `transferWithAuthorization`
//! family of calls, plus the small slice of ERC-20/EIP-712 surface needed to
//! verify and settle an exact-amount x402 payment.

use alloy_sol_types::sol;

sol!(
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    IEIP3009,
    r#"[
        {
            "type": "function",
            "name": "transferWithAuthorization",
            "stateMutability": "nonpayable",
            "inputs": [
                { "name": "from", "type": "address" },
                { "name": "to", "type": "address" },
                { "name": "value", "type": "uint256" },
                { "name": "validAfter", "type": "uint256" },
                { "name": "validBefore", "type": "uint256" },
                { "name": "nonce", "type": "bytes32" },
                { "name": "v", "type": "uint8" },
                { "name": "r", "type": "bytes32" },
                { "name": "s", "type": "bytes32" }
            ],
            "outputs": []
        },
        {
            "type": "function",
            "name": "transferWithAuthorization",
            "stateMutability": "nonpayable",
            "inputs": [
                { "name": "from", "type": "address" },
                { "name": "to", "type": "address" },
                { "name": "value", "type": "uint256" },
                { "name": "validAfter", "type": "uint256" },
                { "name": "validBefore", "type": "uint256" },
                { "name": "nonce", "type": "bytes32" },
                { "name": "signature", "type": "bytes" }
            ],
            "outputs": []
        },
        {
            "type": "function",
            "name": "balanceOf",
            "stateMutability": "view",
            "inputs": [{ "name": "account", "type": "address" }],
            "outputs": [{ "name": "", "type": "uint256" }]
        },
        {
            "type": "function",
            "name": "authorizationState",
            "stateMutability": "view",
            "inputs": [
                { "name": "authorizer", "type": "address" },
                { "name": "nonce", "type": "bytes32" }
            ],
            "outputs": [{ "name": "", "type": "bool" }]
        },
        {
            "type": "function",
            "name": "name",
            "stateMutability": "view",
            "inputs": [],
            "outputs": [{ "name": "", "type": "string" }]
        },
        {
            "type": "function",
            "name": "version",
            "stateMutability": "view",
            "inputs": [],
            "outputs": [{ "name": "", "type": "string" }]
        },
        {
            "type": "function",
            "name": "DOMAIN_SEPARATOR",
            "stateMutability": "view",
            "inputs": [],
            "outputs": [{ "name": "", "type": "bytes32" }]
        }
    ]"#
);
